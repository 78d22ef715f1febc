// Circuit breaker guarding calls to an unreliable downstream dependency.
//
// Purpose
// - Fail fast while a dependency is down instead of stacking up slow or failing calls.
//
// Responsibilities
// - Count outcomes in a count-based sliding window while Closed.
// - Open when the failure rate crosses the threshold, short-circuit for a cooldown.
// - After the cooldown, admit a limited number of trial calls (Half-Open) and
//   close again on success or reopen on failure.
// - Bound every guarded call with a timeout. A timeout is a failure.
// - Apply an outcome only to the state the call was admitted in. Results of calls
//   that outlive a transition are dropped.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Failure rate in `0.0..=1.0` at which the breaker opens.
    pub failure_rate_threshold: f64,

    /// Number of most recent call outcomes kept while Closed.
    pub sliding_window_size: usize,

    /// Outcomes required in the window before the failure rate is evaluated.
    /// Capped at `sliding_window_size`.
    pub minimum_number_of_calls: usize,

    /// How long the breaker stays Open before admitting trial calls.
    pub wait_duration_in_open_state: Duration,

    /// Trial calls admitted while Half-Open. All must succeed to close.
    pub permitted_calls_in_half_open_state: u32,

    /// Upper bound for a single guarded call.
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            sliding_window_size: 10,
            minimum_number_of_calls: 5,
            wait_duration_in_open_state: Duration::from_secs(10),
            permitted_calls_in_half_open_state: 1,
            call_timeout: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open")]
    Open,

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Inner(E),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub failure_rate: f64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    // true marks a failed call
    outcomes: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_admitted: u32,
    half_open_succeeded: u32,
    // bumped on every transition
    generation: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, mut config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        if config.minimum_number_of_calls > config.sliding_window_size {
            tracing::warn!(
                breaker = %name,
                minimum_number_of_calls = config.minimum_number_of_calls,
                sliding_window_size = config.sliding_window_size,
                "minimum number of calls exceeds the window, capping it"
            );
            config.minimum_number_of_calls = config.sliding_window_size;
        }
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                outcomes: VecDeque::with_capacity(config.sliding_window_size),
                opened_at: None,
                half_open_admitted: 0,
                half_open_succeeded: 0,
                generation: 0,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        inner.state
    }

    pub fn metrics(&self) -> CircuitMetrics {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        let failed_calls = inner.outcomes.iter().filter(|failed| **failed).count();
        CircuitMetrics {
            state: inner.state,
            buffered_calls: inner.outcomes.len(),
            failed_calls,
            failure_rate: failure_rate(&inner.outcomes),
        }
    }

    /// Runs `operation` through the breaker.
    ///
    /// The operation is not polled at all when the breaker is Open.
    pub async fn call<T, E, F>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire() else {
            return Err(CircuitBreakerError::Open);
        };

        match tokio::time::timeout(self.config.call_timeout, operation).await {
            Ok(Ok(value)) => {
                permit.succeeded();
                Ok(value)
            }
            Ok(Err(error)) => {
                permit.failed();
                Err(CircuitBreakerError::Inner(error))
            }
            Err(_) => {
                permit.failed();
                Err(CircuitBreakerError::Timeout(self.config.call_timeout))
            }
        }
    }

    fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        match inner.state {
            CircuitState::Closed => Some(CallPermit::new(self, inner.generation)),
            CircuitState::Open => None,
            CircuitState::HalfOpen => {
                if inner.half_open_admitted < self.config.permitted_calls_in_half_open_state {
                    inner.half_open_admitted += 1;
                    Some(CallPermit::new(self, inner.generation))
                } else {
                    None
                }
            }
        }
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.lock();
        if self.is_stale(&inner, generation) {
            return;
        }
        match inner.state {
            CircuitState::Closed => self.record(&mut inner, false),
            CircuitState::HalfOpen => {
                inner.half_open_succeeded += 1;
                if inner.half_open_succeeded >= self.config.permitted_calls_in_half_open_state {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.lock();
        if self.is_stale(&inner, generation) {
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                self.record(&mut inner, true);
                if inner.outcomes.len() >= self.config.minimum_number_of_calls
                    && failure_rate(&inner.outcomes) >= self.config.failure_rate_threshold
                {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open),
            CircuitState::Open => {}
        }
    }

    fn is_stale(&self, inner: &BreakerState, generation: u64) -> bool {
        let stale = inner.generation != generation;
        if stale {
            tracing::debug!(
                breaker = %self.name,
                state = ?inner.state,
                "ignoring the outcome of a call admitted before the last transition"
            );
        }
        stale
    }

    fn record(&self, inner: &mut BreakerState, failed: bool) {
        inner.outcomes.push_back(failed);
        while inner.outcomes.len() > self.config.sliding_window_size {
            inner.outcomes.pop_front();
        }
    }

    fn refresh(&self, inner: &mut BreakerState) {
        if inner.state != CircuitState::Open {
            return;
        }
        let cooled_down = inner
            .opened_at
            .is_some_and(|at| at.elapsed() >= self.config.wait_duration_in_open_state);
        if cooled_down {
            self.transition(inner, CircuitState::HalfOpen);
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.half_open_admitted = 0;
        inner.half_open_succeeded = 0;
        match to {
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
                inner.outcomes.clear();
                tracing::warn!(breaker = %self.name, ?from, "circuit breaker opened");
            }
            CircuitState::HalfOpen => {
                tracing::info!(breaker = %self.name, "circuit breaker half-open, admitting trial calls");
            }
            CircuitState::Closed => {
                inner.opened_at = None;
                inner.outcomes.clear();
                tracing::info!(breaker = %self.name, ?from, "circuit breaker closed");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn failure_rate(outcomes: &VecDeque<bool>) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    let failed = outcomes.iter().filter(|failed| **failed).count();
    failed as f64 / outcomes.len() as f64
}

/// Admission to run one guarded call. Dropping it unsettled counts as a failure,
/// so a cancelled trial call cannot wedge the breaker in Half-Open.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64) -> Self {
        Self {
            breaker,
            generation,
            settled: false,
        }
    }

    fn succeeded(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation);
    }

    fn failed(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_failure(self.generation);
        }
    }
}
