//! Shared configuration for hartkey tools.
//!
//! TOML config file, `HARTKEY_*` environment overrides, token resolution
//! (env var + keyring + plaintext) and translation to
//! `hartkey_core::SyncConfig`. The CLI layers its flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hartkey_api::Endpoints;
use hartkey_api::client::{DEFAULT_EVENTS_URL, DEFAULT_HOUSEHOLD_URL};
use hartkey_core::SyncConfig;
use hartkey_core::config::{DEFAULT_INTERVAL_MINUTES, clamp_interval_minutes};

/// Keyring service name; the token is stored under [`KEYRING_USER`].
pub const KEYRING_SERVICE: &str = "hartkey";
pub const KEYRING_USER: &str = "token";

/// Environment variable prefix for config overrides, e.g.
/// `HARTKEY_ACCOUNT__INTERVAL_MINUTES=10`.
pub const ENV_PREFIX: &str = "HARTKEY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no token configured")]
    NoToken,

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub account: Account,
}

/// Output and transport defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    15
}

/// The Hartkey account to sync.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Account {
    /// Bearer token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Poll interval in minutes, 1..=1440.
    #[serde(default = "default_interval")]
    pub interval_minutes: u64,

    /// Household service override (device list, open).
    pub household_url: Option<String>,

    /// Events service override.
    pub events_url: Option<String>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            token: None,
            token_env: None,
            interval_minutes: default_interval(),
            household_url: None,
            events_url: None,
        }
    }
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MINUTES
}

impl Account {
    /// Service base URLs, defaulting to the public Hartkey endpoints.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let household = self.household_url.as_deref().unwrap_or(DEFAULT_HOUSEHOLD_URL);
        let events = self.events_url.as_deref().unwrap_or(DEFAULT_EVENTS_URL);
        Endpoints::new(household, events).map_err(|e| ConfigError::Validation {
            field: "account.household_url/events_url".into(),
            reason: e.to_string(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hartkey", "hartkey").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hartkey");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + environment. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the bearer token: `token_env` variable, then system keyring,
/// then plaintext in the config file.
pub fn resolve_token(account: &Account) -> Result<SecretString, ConfigError> {
    resolve_token_with(account, |name| std::env::var(name).ok(), keyring_token)
}

/// [`resolve_token`] with injectable lookups.
pub fn resolve_token_with(
    account: &Account,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. token_env → env var lookup
    if let Some(value) = account.token_env.as_deref().and_then(&env) {
        if !value.is_empty() {
            return Ok(SecretString::from(value));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring() {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(token) = account.token.as_ref().filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken)
}

fn keyring_token() -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store the token in the system keyring.
pub fn store_token(token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    entry.set_password(token)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `SyncConfig` from the file config and an already-resolved token.
pub fn to_sync_config(cfg: &Config, token: SecretString) -> Result<SyncConfig, ConfigError> {
    if cfg.defaults.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "defaults.timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    Ok(SyncConfig::new(token)
        .with_endpoints(cfg.account.endpoints()?)
        .with_interval_minutes(clamp_interval_minutes(cfg.account.interval_minutes))
        .with_timeout(Duration::from_secs(cfg.defaults.timeout)))
}
