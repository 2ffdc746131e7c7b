//! CLI configuration: thin wrapper around `hartkey_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--token`, `--interval`, `--timeout`, `--output`).

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use hartkey_core::SyncConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use hartkey_config::{
    Config, config_path, load_config_or_default, resolve_token, save_config, store_token,
    to_sync_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Fill in `--output` from the config file when the flag was not given.
pub fn apply_output_default(global: &mut GlobalOpts, config: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&config.defaults.output, true).ok();
    }
}

/// Translate the config file + global flags into a `SyncConfig`.
///
/// CLI flag overrides take priority over file values.
pub fn resolve_sync_config(global: &GlobalOpts, config: &Config) -> Result<SyncConfig, CliError> {
    // 1. Token (flag/env > token_env > keyring > plaintext)
    let token = match global.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => SecretString::from(token.to_owned()),
        None => resolve_token(&config.account)?,
    };

    // 2. File-level settings
    let mut sync = to_sync_config(config, token)?;

    // 3. Flag overrides
    if let Some(minutes) = global.interval {
        sync = sync.with_interval_minutes(minutes);
    }
    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        sync = sync.with_timeout(Duration::from_secs(secs));
    }

    Ok(sync)
}
