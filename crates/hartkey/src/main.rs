mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::io;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use hartkey_core::CloudCoordinator;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

const BIN_NAME: &str = "hartkey";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `RUST_LOG` wins over `-v` / `-q` when it is set.
fn init_logging(global: &GlobalOpts) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(global.verbose, global.quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Directives for a verbosity level.
///
/// `-v` shows poll cycle summaries and `-vv` the request lines, both from
/// the hartkey crates only. `-vvv` also lets the HTTP stack through.
fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "warn,hartkey=info,hartkey_core=info,hartkey_api=info",
        2 => "warn,hartkey=debug,hartkey_core=debug,hartkey_api=debug",
        _ => "trace",
    }
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    config::apply_output_default(&mut cli.global, &cfg);

    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global).await,
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), BIN_NAME, &mut io::stdout());
            Ok(())
        }
        cmd => {
            let sync_config = config::resolve_sync_config(&cli.global, &cfg)?;
            let coordinator = CloudCoordinator::from_config(sync_config)?;
            tracing::debug!(command = ?cmd, "coordinator ready");

            // A pending open follow-up or watch loop must not outlive the command.
            let result = commands::dispatch(cmd, &coordinator, &cli.global).await;
            coordinator.shutdown().await;
            result
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbosity() {
        assert_eq!(log_filter(0, true), "error");
        assert_eq!(log_filter(3, true), "error");
    }

    #[test]
    fn verbosity_widens_hartkey_crates_before_http_stack() {
        assert_eq!(log_filter(0, false), "warn");
        assert!(log_filter(1, false).contains("hartkey_core=info"));
        assert!(log_filter(2, false).contains("hartkey_api=debug"));
        assert!(log_filter(2, false).starts_with("warn,"));
        assert_eq!(log_filter(9, false), "trace");
    }

    #[test]
    fn filters_parse() {
        for verbose in 0..=3 {
            EnvFilter::try_new(log_filter(verbose, false)).unwrap();
        }
    }
}
