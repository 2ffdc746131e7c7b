// ── Runtime sync configuration ──
//
// Describes *how* to talk to the Hartkey cloud and how often to poll.
// Carries the bearer token but never touches disk: the CLI constructs a
// `SyncConfig` from its profile and hands it in.

use std::time::Duration;

use hartkey_api::{Endpoints, MAX_EVENT_PAGE};
use secrecy::SecretString;

pub use hartkey_api::transport::DEFAULT_TIMEOUT;

pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;
pub const MIN_INTERVAL_MINUTES: u64 = 1;
pub const MAX_INTERVAL_MINUTES: u64 = 1440;

/// Events requested per device and cycle. Only the newest one is kept.
pub const DEFAULT_EVENT_LIMIT: u32 = MAX_EVENT_PAGE;

/// Concurrent per-device event fetches within one cycle.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Delay between a successful open and the follow-up refresh, so the
/// resulting event has time to reach the events service.
pub const DEFAULT_OPEN_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// First retry delay after a transient failure.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(15);

/// Configuration for one sync coordinator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bearer token for the remote API.
    pub token: SecretString,
    /// Remote service base URLs.
    pub endpoints: Endpoints,
    /// Poll interval, always within `MIN..=MAX_INTERVAL_MINUTES`.
    update_interval: Duration,
    /// HTTP request timeout.
    pub timeout: Duration,
    pub event_limit: u32,
    pub fetch_concurrency: usize,
    pub open_settle_delay: Duration,
    pub retry_base: Duration,
}

impl SyncConfig {
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            endpoints: Endpoints::default(),
            update_interval: minutes(DEFAULT_INTERVAL_MINUTES),
            timeout: DEFAULT_TIMEOUT,
            event_limit: DEFAULT_EVENT_LIMIT,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            open_settle_delay: DEFAULT_OPEN_SETTLE_DELAY,
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    /// Set the poll interval in minutes, clamped to the supported range.
    pub fn with_interval_minutes(mut self, interval: u64) -> Self {
        self.update_interval = minutes(clamp_interval_minutes(interval));
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_limit(mut self, limit: u32) -> Self {
        self.event_limit = limit.clamp(1, MAX_EVENT_PAGE);
        self
    }

    pub fn with_open_settle_delay(mut self, delay: Duration) -> Self {
        self.open_settle_delay = delay;
        self
    }

    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn interval_minutes(&self) -> u64 {
        self.update_interval.as_secs() / 60
    }
}

/// Clamp a user-supplied interval to `MIN..=MAX_INTERVAL_MINUTES`.
pub fn clamp_interval_minutes(interval: u64) -> u64 {
    interval.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES)
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SyncConfig {
        SyncConfig::new(SecretString::from("t".to_string()))
    }

    #[test]
    fn default_interval_is_five_minutes() {
        let config = config();
        assert_eq!(config.interval_minutes(), 5);
        assert_eq!(config.update_interval(), Duration::from_secs(300));
    }

    #[test]
    fn interval_is_clamped() {
        assert_eq!(config().with_interval_minutes(0).interval_minutes(), 1);
        assert_eq!(config().with_interval_minutes(2000).interval_minutes(), 1440);
        assert_eq!(config().with_interval_minutes(30).interval_minutes(), 30);
    }

    #[test]
    fn event_limit_stays_within_page() {
        assert_eq!(config().with_event_limit(0).event_limit, 1);
        assert_eq!(config().with_event_limit(500).event_limit, MAX_EVENT_PAGE);
    }
}
