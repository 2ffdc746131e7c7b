//! Config subcommand handlers.

use std::io::{self, BufRead};

use secrecy::SecretString;

use hartkey_core::CloudCoordinator;
use hartkey_core::config::{MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` that is safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    if cfg.account.token.is_some() {
        cfg.account.token = Some("****".into());
    }
    cfg
}

/// Format config for display. Expects an already redacted config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out);
    let _ = writeln!(out, "[account]");
    if let Some(ref token) = cfg.account.token {
        let _ = writeln!(out, "token = \"{token}\"");
    }
    if let Some(ref env) = cfg.account.token_env {
        let _ = writeln!(out, "token_env = \"{env}\"");
    }
    let _ = writeln!(out, "interval_minutes = {}", cfg.account.interval_minutes);
    if let Some(ref url) = cfg.account.household_url {
        let _ = writeln!(out, "household_url = \"{url}\"");
    }
    if let Some(ref url) = cfg.account.events_url {
        let _ = writeln!(out, "events_url = \"{url}\"");
    }

    out
}

/// Take the token from the argument, or the first line of stdin.
fn read_token(arg: Option<String>) -> Result<String, CliError> {
    let token = match arg {
        Some(token) => token,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        }
    };

    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token.to_owned())
}

fn check_interval(minutes: u64) -> Result<(), CliError> {
    if (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "interval".into(),
            reason: format!(
                "must be between {MIN_INTERVAL_MINUTES} and {MAX_INTERVAL_MINUTES} minutes"
            ),
        })
    }
}

/// Check `token` with a single device listing.
async fn verify_token(cfg: &Config, token: &str) -> Result<usize, CliError> {
    let secret = SecretString::from(token.to_owned());
    let sync = config::to_sync_config(cfg, secret.clone())?;
    let coordinator = CloudCoordinator::from_config(sync)?;
    Ok(coordinator.validate_token(&secret).await?)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.format(), &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken {
            token,
            verify,
            plaintext,
        } => {
            let token = read_token(token)?;
            let mut cfg = config::load_config_or_default();

            if verify {
                let devices = verify_token(&cfg, &token).await?;
                if !global.quiet {
                    eprintln!("Token accepted, {devices} device(s) visible");
                }
            }

            if plaintext {
                cfg.account.token = Some(token);
                config::save_config(&cfg)?;
                if !global.quiet {
                    eprintln!("Token saved to {}", config::config_path().display());
                }
            } else {
                config::store_token(&token)?;
                if !global.quiet {
                    eprintln!("Token stored in system keyring");
                }
            }
            Ok(())
        }

        ConfigCommand::SetInterval { minutes } => {
            check_interval(minutes)?;
            let mut cfg = config::load_config_or_default();
            cfg.account.interval_minutes = minutes;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Poll interval set to {minutes} minute(s)");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_token() {
        let mut cfg = Config::default();
        cfg.account.token = Some("secret-token".into());

        let text = format_config(&redacted(&cfg));
        assert!(text.contains("token = \"****\""));
        assert!(!text.contains("secret-token"));
        assert!(text.contains("interval_minutes = 5"));
    }

    #[test]
    fn token_argument_is_trimmed() {
        assert_eq!(read_token(Some("  abc \n".into())).unwrap(), "abc");
        assert!(matches!(
            read_token(Some("   ".into())),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn interval_bounds_are_enforced() {
        assert!(check_interval(1).is_ok());
        assert!(check_interval(1440).is_ok());
        assert!(check_interval(0).is_err());
        assert!(check_interval(1441).is_err());
    }
}
