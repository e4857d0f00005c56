//! Retry configuration.

use crate::error::RetryableError;
use std::time::Duration;

/// Delay between two attempts of the same broker call.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay every time.
    Fixed(Duration),
    /// Doubling delay starting at `base`, never above `cap`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Upper bound for any delay.
        cap: Duration,
        /// Random spread as a fraction of the delay (0.0 disables it).
        jitter: f64,
    },
}

impl Backoff {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential { base, cap, jitter } => {
                let exp = retry.saturating_sub(1).min(16);
                let raw = base.as_secs_f64() * f64::from(1u32 << exp);
                let spread = if *jitter > 0.0 {
                    raw * jitter * jitter_factor()
                } else {
                    0.0
                };
                Duration::from_secs_f64((raw + spread).clamp(0.0, cap.as_secs_f64()))
            }
        }
    }

    fn cap(&self) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential { cap, .. } => *cap,
        }
    }
}

/// How often and how patiently a broker call is retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay policy.
    pub backoff: Backoff,
    /// HTTP statuses retried on top of 429 and 5xx.
    pub extra_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::for_broker(2)
    }
}

impl RetryConfig {
    /// Same as [`RetryConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Broker preset: `max_retries` jittered retries starting at 250ms,
    /// capped at 5s.
    pub fn for_broker(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(250),
                cap: Duration::from_secs(5),
                jitter: 0.1,
            },
            extra_statuses: Vec::new(),
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::for_broker(0)
    }

    /// Set the retry count.
    #[must_use]
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Wait a fixed delay between attempts.
    #[must_use]
    pub fn fixed(mut self, delay: Duration) -> Self {
        self.backoff = Backoff::Fixed(delay);
        self
    }

    /// Also retry on `status`.
    #[must_use]
    pub fn retry_status(mut self, status: u16) -> Self {
        self.extra_statuses.push(status);
        self
    }

    /// Whether `error` is worth another attempt.
    pub fn should_retry(&self, error: &RetryableError) -> bool {
        error.is_retryable()
            || error
                .status()
                .is_some_and(|status| self.extra_statuses.contains(&status))
    }

    /// Delay before retry number `retry`. A server `Retry-After` hint wins
    /// but never exceeds the backoff cap.
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.backoff.cap()),
            None => self.backoff.delay(retry),
        }
    }
}

/// Uniform factor in `[-1.0, 1.0)`.
fn jitter_factor() -> f64 {
    use rand::Rng;
    rand::thread_rng().gen_range(-1.0..1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
        assert!(matches!(config.backoff, Backoff::Exponential { .. }));
        assert!(config.extra_statuses.is_empty());
    }

    #[test]
    fn test_fixed_delay() {
        let config = RetryConfig::new().fixed(Duration::from_secs(1));
        assert_eq!(config.delay_for(1, None), Duration::from_secs(1));
        assert_eq!(config.delay_for(4, None), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_doubles_until_cap() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            cap: Duration::from_millis(350),
            jitter: 0.0,
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(350));
        assert_eq!(backoff.delay(40), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_respects_cap() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(4),
            cap: Duration::from_secs(5),
            jitter: 0.5,
        };
        for retry in 1..6 {
            assert!(backoff.delay(retry) <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_retry_after_hint_is_capped() {
        let config = RetryConfig::for_broker(1);
        assert_eq!(
            config.delay_for(1, Some(Duration::from_secs(30))),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.delay_for(1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_extra_status() {
        let config = RetryConfig::new().retry_status(409);
        assert!(config.should_retry(&RetryableError::http(409, "")));
        assert!(config.should_retry(&RetryableError::http(502, "")));
        assert!(!config.should_retry(&RetryableError::http(400, "")));
    }
}
