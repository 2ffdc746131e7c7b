// ── Core error types ──
//
// User-facing errors from hartkey-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<hartkey_api::Error>`
// impl folds transport-layer errors into the four failure classes the
// coordinator reasons about (auth, transient, protocol, busy).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::DeviceId;

/// Classification of a remote failure, as reported in sync updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Token rejected; stops until a new token is supplied.
    Auth,
    /// Network, timeout or server-side failure; retried with backoff.
    Transient,
    /// The remote answered with something unparseable or unexpected.
    Protocol,
    /// A device refused a command because it is mid-operation.
    DeviceBusy,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote failures ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Remote service unavailable: {message}")]
    Transient { message: String },

    #[error("Unexpected response from remote service: {message}")]
    Protocol { message: String },

    #[error("Device {device_id} is busy: {message}")]
    DeviceBusy { device_id: DeviceId, message: String },

    // ── Local precondition failures ──────────────────────────────────
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: DeviceId },

    #[error("Device {device_id} cannot be opened remotely")]
    OpenUnsupported { device_id: DeviceId },

    #[error("Coordinator has been shut down")]
    Stopped,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Failure class for remote errors; `None` for local ones.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Auth { .. } => Some(ErrorKind::Auth),
            Self::Transient { .. } => Some(ErrorKind::Transient),
            Self::Protocol { .. } => Some(ErrorKind::Protocol),
            Self::DeviceBusy { .. } => Some(ErrorKind::DeviceBusy),
            Self::DeviceNotFound { .. }
            | Self::OpenUnsupported { .. }
            | Self::Stopped
            | Self::Config { .. } => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hartkey_api::Error> for CoreError {
    fn from(err: hartkey_api::Error) -> Self {
        match err {
            hartkey_api::Error::Authentication { status } => CoreError::Auth {
                message: format!("bearer token rejected (HTTP {status})"),
            },
            hartkey_api::Error::Transport(ref e) => {
                let message = if e.is_timeout() {
                    "request timed out".to_owned()
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    e.to_string()
                };
                CoreError::Transient { message }
            }
            hartkey_api::Error::Server { status, message } => CoreError::Transient {
                message: format!("HTTP {status}: {message}"),
            },
            hartkey_api::Error::Api { status, message } => CoreError::Protocol {
                message: format!("HTTP {status}: {message}"),
            },
            hartkey_api::Error::Deserialization { message, .. } => CoreError::Protocol { message },
            hartkey_api::Error::DeviceBusy { device_id, message } => CoreError::DeviceBusy {
                device_id: DeviceId::from(device_id),
                message,
            },
            hartkey_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            hartkey_api::Error::ClientBuild(message) => CoreError::Config { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_fold_into_kinds() {
        let auth: CoreError = hartkey_api::Error::Authentication { status: 403 }.into();
        assert_eq!(auth.kind(), Some(ErrorKind::Auth));

        let server: CoreError = hartkey_api::Error::Server {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert_eq!(server.kind(), Some(ErrorKind::Transient));

        let malformed: CoreError = hartkey_api::Error::Deserialization {
            message: "missing field `devices`".into(),
            body: "{}".into(),
        }
        .into();
        assert_eq!(malformed.kind(), Some(ErrorKind::Protocol));

        let busy: CoreError = hartkey_api::Error::DeviceBusy {
            device_id: "7".into(),
            message: "locked".into(),
        }
        .into();
        assert!(matches!(
            busy,
            CoreError::DeviceBusy { ref device_id, .. } if device_id.as_str() == "7"
        ));
    }

    #[test]
    fn local_errors_have_no_kind() {
        assert_eq!(CoreError::Stopped.kind(), None);
        assert_eq!(
            CoreError::DeviceNotFound {
                device_id: "x".into()
            }
            .kind(),
            None
        );
    }
}
