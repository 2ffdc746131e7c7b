//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hartkey_config::ConfigError;
use hartkey_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const BUSY: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Hartkey service: {message}")]
    #[diagnostic(
        code(hartkey::connection_failed),
        help("Check your network connection, or raise the request timeout with --timeout.")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(hartkey::auth_failed),
        help(
            "The token was rejected. Store a fresh one with:\n\
             hartkey config set-token --verify"
        )
    )]
    AuthFailed { message: String },

    #[error("No token configured")]
    #[diagnostic(
        code(hartkey::no_token),
        help(
            "Pass --token, set HARTKEY_TOKEN, or run: hartkey config set-token\n\
             Config file: {path}"
        )
    )]
    NoToken { path: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(hartkey::not_found),
        help("Run: hartkey devices to see available devices")
    )]
    NotFound { identifier: String },

    #[error("Device '{identifier}' cannot be opened remotely")]
    #[diagnostic(
        code(hartkey::open_unsupported),
        help("Remote opening must be set up for this device in the Hartkey app.")
    )]
    OpenUnsupported { identifier: String },

    #[error("Device '{identifier}' is busy: {message}")]
    #[diagnostic(
        code(hartkey::device_busy),
        help("Another open is in progress. Try again in a few seconds.")
    )]
    DeviceBusy { identifier: String, message: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Unexpected response from the Hartkey service: {message}")]
    #[diagnostic(code(hartkey::protocol))]
    Protocol { message: String },

    #[error("Sync stopped before the operation completed")]
    #[diagnostic(code(hartkey::stopped))]
    Stopped,

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hartkey::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(hartkey::config),
        help("Inspect the current configuration with: hartkey config show")
    )]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoToken { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::OpenUnsupported { .. } => exit_code::UNSUPPORTED,
            Self::DeviceBusy { .. } => exit_code::BUSY,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Protocol { .. } | Self::Stopped | Self::Config { .. } | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }

    /// Error for a poll cycle that finished with `kind`.
    pub fn from_sync_failure(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Auth => Self::AuthFailed {
                message: "token rejected by the remote service".into(),
            },
            ErrorKind::Transient => Self::ConnectionFailed {
                message: "device refresh failed".into(),
            },
            ErrorKind::Protocol | ErrorKind::DeviceBusy => Self::Protocol {
                message: format!("device refresh failed ({kind})"),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => Self::AuthFailed { message },
            CoreError::Transient { message } => Self::ConnectionFailed { message },
            CoreError::Protocol { message } => Self::Protocol { message },
            CoreError::DeviceBusy { device_id, message } => Self::DeviceBusy {
                identifier: device_id.to_string(),
                message,
            },
            CoreError::DeviceNotFound { device_id } => Self::NotFound {
                identifier: device_id.to_string(),
            },
            CoreError::OpenUnsupported { device_id } => Self::OpenUnsupported {
                identifier: device_id.to_string(),
            },
            CoreError::Stopped => Self::Stopped,
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoToken => Self::NoToken {
                path: hartkey_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
