use thiserror::Error;

/// Top-level error type for the `hartkey-api` crate.
///
/// Every failure is reported as-is: the client never retries. Callers
/// classify errors with [`is_auth`](Self::is_auth),
/// [`is_transient`](Self::is_transient) and [`is_protocol`](Self::is_protocol)
/// to decide on their own retry policy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The bearer token was rejected (HTTP 401 / 403).
    #[error("Authentication failed (HTTP {status}): bearer token rejected")]
    Authentication { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server-side failure (5xx) or rate limiting (429).
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Failed to build the underlying HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Unexpected non-success status that is neither auth nor server-side.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The device is already in the middle of an operation (HTTP 409 / 423).
    #[error("Device {device_id} is busy: {message}")]
    DeviceBusy { device_id: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body did not match the expected shape, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the bearer token was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` for network, timeout, and server-side failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    /// Returns `true` when the remote answered with something we could not
    /// make sense of (malformed body or unexpected status).
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Deserialization { .. } | Self::Api { .. })
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status }
            | Self::Server { status, .. }
            | Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
