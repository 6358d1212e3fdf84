use std::time::Duration;

use crate::config::DEFAULT_RETRIES;

/// Retry policy for connection establishment.
///
/// Stateless; one instance drives a single connect call. Retries apply to
/// connection establishment only, never to authentication: presenting the
/// same rejected credential again cannot succeed.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Unit delay; retry `n` waits `n * n` times this.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Backoff before retry `attempt` (1-based). Quadratic growth keeps
    /// successive waits strictly increasing.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_mul(attempt)
    }
}
