// ── Poll retry schedule ──
//
// Decides how long the sync loop sleeps after a cycle. Success and auth
// failures wait a full interval (an auth failure cannot heal by itself);
// transient and protocol failures back off exponentially from `base`,
// never exceeding the interval.

use std::time::Duration;

use crate::error::ErrorKind;

/// Doubling is capped at 2^16 so the multiplication cannot overflow.
const MAX_EXPONENT: u32 = 16;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base: Duration,
    interval: Duration,
    consecutive_failures: u32,
}

impl RetryPolicy {
    pub fn new(base: Duration, interval: Duration) -> Self {
        Self {
            base: base.min(interval),
            interval,
            consecutive_failures: 0,
        }
    }

    /// Record the outcome of a cycle and return the delay until the next.
    pub fn next_delay(&mut self, outcome: Option<ErrorKind>) -> Duration {
        match outcome {
            None | Some(ErrorKind::Auth) => {
                self.consecutive_failures = 0;
                self.interval
            }
            Some(ErrorKind::Transient | ErrorKind::Protocol | ErrorKind::DeviceBusy) => {
                let exponent = self.consecutive_failures.min(MAX_EXPONENT);
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.base.saturating_mul(1 << exponent).min(self.interval)
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(15);
    const INTERVAL: Duration = Duration::from_secs(300);

    #[test]
    fn transient_failures_double_until_interval() {
        let mut policy = RetryPolicy::new(BASE, INTERVAL);
        let delays: Vec<u64> = (0..7)
            .map(|_| policy.next_delay(Some(ErrorKind::Transient)).as_secs())
            .collect();
        assert_eq!(delays, vec![15, 30, 60, 120, 240, 300, 300]);
    }

    #[test]
    fn success_resets_backoff() {
        let mut policy = RetryPolicy::new(BASE, INTERVAL);
        policy.next_delay(Some(ErrorKind::Protocol));
        policy.next_delay(Some(ErrorKind::Transient));
        assert_eq!(policy.next_delay(None), INTERVAL);
        assert_eq!(policy.consecutive_failures(), 0);
        assert_eq!(policy.next_delay(Some(ErrorKind::Transient)), BASE);
    }

    #[test]
    fn auth_failure_waits_full_interval() {
        let mut policy = RetryPolicy::new(BASE, INTERVAL);
        assert_eq!(policy.next_delay(Some(ErrorKind::Auth)), INTERVAL);
    }

    #[test]
    fn base_never_exceeds_interval() {
        let mut policy = RetryPolicy::new(Duration::from_secs(600), Duration::from_secs(60));
        assert_eq!(
            policy.next_delay(Some(ErrorKind::Transient)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn many_failures_do_not_overflow() {
        let mut policy = RetryPolicy::new(BASE, INTERVAL);
        for _ in 0..100 {
            assert!(policy.next_delay(Some(ErrorKind::Transient)) <= INTERVAL);
        }
    }
}
