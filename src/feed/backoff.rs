//! Bounded exponential backoff for source reconnects and retries

use std::time::Duration;

/// Exponential backoff with a delay ceiling and an attempt budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial: Duration,
    /// Delay ceiling
    pub max: Duration,
    /// Consecutive failures tolerated before giving up
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max,
            max_attempts,
        }
    }

    /// Start tracking a fresh run of failures
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: *self,
            attempts: 0,
            next_delay: self.initial,
        }
    }
}

/// Failure counter for one source, produced by [`BackoffPolicy::start`]
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempts: u32,
    next_delay: Duration,
}

impl Backoff {
    /// Record a failure; returns the delay to wait, or `None` once the
    /// attempt budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        let delay = self.next_delay;
        self.next_delay = (self.next_delay * 2).min(self.policy.max);
        Some(delay)
    }

    /// Reset after a success
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.next_delay = self.policy.initial;
    }

    /// Failures recorded since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_up_to_ceiling() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(5), 10);
        let mut backoff = policy.start();

        let delays: Vec<_> = (0..5).filter_map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(5),
                Duration::from_secs(5),
            ]
        );
    }

    #[test]
    fn test_budget_exhausted() {
        let policy = BackoffPolicy::new(Duration::from_millis(10), Duration::from_secs(1), 3);
        let mut backoff = policy.start();

        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
        assert_eq!(backoff.attempts(), 3);
    }

    #[test]
    fn test_reset_restores_initial_delay() {
        let policy = BackoffPolicy::default();
        let mut backoff = policy.start();

        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();

        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(1)));
    }
}
