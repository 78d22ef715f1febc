// Runtime configuration read from the environment.
//
// Every key has a default, so an empty environment starts a working local service.
// A value that is present but does not parse is an error, never silently replaced.

use crate::modules::workload::use_cases::apply_workload::aggregator::DEFAULT_MAX_CONFLICT_RETRIES;
use crate::shared::infrastructure::circuit_breaker::CircuitBreakerConfig;
use crate::shared::infrastructure::message_channel::redelivery::RedeliveryPolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const HTTP_ADDR: &str = "WORKLOAD_HTTP_ADDR";
pub const PARTITIONS: &str = "WORKLOAD_PARTITIONS";
pub const CHANNEL_CAPACITY: &str = "WORKLOAD_CHANNEL_CAPACITY";
pub const MAX_DELIVERY_ATTEMPTS: &str = "WORKLOAD_MAX_DELIVERY_ATTEMPTS";
pub const REDELIVERY_INITIAL_DELAY_MS: &str = "WORKLOAD_REDELIVERY_INITIAL_DELAY_MS";
pub const REDELIVERY_MAX_DELAY_MS: &str = "WORKLOAD_REDELIVERY_MAX_DELAY_MS";
pub const BREAKER_FAILURE_RATE: &str = "WORKLOAD_BREAKER_FAILURE_RATE";
pub const BREAKER_WINDOW: &str = "WORKLOAD_BREAKER_WINDOW";
pub const BREAKER_MIN_CALLS: &str = "WORKLOAD_BREAKER_MIN_CALLS";
pub const BREAKER_OPEN_MS: &str = "WORKLOAD_BREAKER_OPEN_MS";
pub const PUBLISH_TIMEOUT_MS: &str = "WORKLOAD_PUBLISH_TIMEOUT_MS";
pub const CONFLICT_RETRIES: &str = "WORKLOAD_CONFLICT_RETRIES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub partitions: usize,
    pub channel_capacity: usize,
    pub redelivery: RedeliveryPolicy,
    pub breaker: CircuitBreakerConfig,
    pub max_conflict_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            partitions: 4,
            channel_capacity: 1024,
            redelivery: RedeliveryPolicy::DEFAULT,
            breaker: CircuitBreakerConfig::default(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl AppConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &'static str| lookup(key).map(|value| (key, value));

        let redelivery = RedeliveryPolicy {
            max_attempts: positive(var(MAX_DELIVERY_ATTEMPTS), defaults.redelivery.max_attempts)?,
            initial_delay: millis(var(REDELIVERY_INITIAL_DELAY_MS), defaults.redelivery.initial_delay)?,
            max_delay: millis(var(REDELIVERY_MAX_DELAY_MS), defaults.redelivery.max_delay)?,
            ..defaults.redelivery
        };

        let failure_rate_threshold =
            parse(var(BREAKER_FAILURE_RATE), defaults.breaker.failure_rate_threshold)?;
        if !(failure_rate_threshold > 0.0 && failure_rate_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: BREAKER_FAILURE_RATE,
                value: failure_rate_threshold.to_string(),
            });
        }
        let breaker = CircuitBreakerConfig {
            failure_rate_threshold,
            sliding_window_size: positive(var(BREAKER_WINDOW), defaults.breaker.sliding_window_size)?,
            minimum_number_of_calls: positive(
                var(BREAKER_MIN_CALLS),
                defaults.breaker.minimum_number_of_calls,
            )?,
            wait_duration_in_open_state: millis(
                var(BREAKER_OPEN_MS),
                defaults.breaker.wait_duration_in_open_state,
            )?,
            call_timeout: millis(var(PUBLISH_TIMEOUT_MS), defaults.breaker.call_timeout)?,
            ..defaults.breaker
        };
        if breaker.minimum_number_of_calls > breaker.sliding_window_size {
            return Err(ConfigError::Invalid {
                key: BREAKER_MIN_CALLS,
                value: breaker.minimum_number_of_calls.to_string(),
            });
        }

        Ok(Self {
            http_addr: parse(var(HTTP_ADDR), defaults.http_addr)?,
            partitions: positive(var(PARTITIONS), defaults.partitions)?,
            channel_capacity: positive(var(CHANNEL_CAPACITY), defaults.channel_capacity)?,
            redelivery,
            breaker,
            max_conflict_retries: parse(var(CONFLICT_RETRIES), defaults.max_conflict_retries)?,
        })
    }
}

fn parse<T: FromStr>(entry: Option<(&'static str, String)>, default: T) -> Result<T, ConfigError> {
    match entry {
        None => Ok(default),
        Some((key, value)) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn positive<T>(entry: Option<(&'static str, String)>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match entry {
        None => Ok(default),
        Some((key, value)) => match value.trim().parse::<T>() {
            Ok(parsed) if parsed > T::default() => Ok(parsed),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

fn millis(entry: Option<(&'static str, String)>, default: Duration) -> Result<Duration, ConfigError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse(entry, default_ms).map(Duration::from_millis)
}
