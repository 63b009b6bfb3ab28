// ── Startup retry policy ──
//
// Controls how `MacStore::connect` waits for a server that is not up yet,
// e.g. a database container still starting next to this one.

use std::time::Duration;

/// How the delay between attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// `delay * 2^attempt`, capped at `max_delay`.
    Exponential,
}

/// Retry configuration for the initial connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the second attempt. Default: 10s.
    pub delay: Duration,

    /// Upper bound for exponential backoff. Default: 5 minutes.
    pub max_delay: Duration,

    /// Total attempts before giving up. `None` means retry forever.
    pub max_attempts: Option<u32>,

    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(300),
            max_attempts: None,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Try exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(1),
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.min(16));
                self.delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }

    /// Whether another attempt is allowed after `attempts` have failed.
    pub fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_waits_ten_seconds_forever() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(10));
        assert_eq!(policy.delay_for(50), Duration::from_secs(10));
        assert!(policy.allows_another(u32::MAX - 1));
    }

    #[test]
    fn exponential_backoff_doubles_then_caps() {
        let policy = RetryPolicy {
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_attempts: None,
            backoff: Backoff::Exponential,
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
    }

    #[test]
    fn bounded_attempts() {
        let policy = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
        assert!(!RetryPolicy::no_retry().allows_another(1));
    }
}
