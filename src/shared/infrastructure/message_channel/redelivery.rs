use std::time::Duration;

/// Exponential backoff between redeliveries of a message that failed transiently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedeliveryPolicy {
    /// Deliveries allowed in total, including the first one.
    pub max_attempts: u32,

    /// Delay before the first redelivery.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RedeliveryPolicy {
    pub const DEFAULT: Self = Self {
        max_attempts: 5,
        initial_delay: Duration::from_millis(200),
        max_delay: Duration::from_secs(5),
        backoff_multiplier: 2.0,
    };

    /// Delay after the given failed attempt (1-indexed):
    /// `initial_delay * backoff_multiplier^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

impl Default for RedeliveryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
