// Resilience guard around the workload EventPublisher.
//
// Purpose
// - Keep the CRM write path independent of broker health.
//
// Responsibilities
// - Run every publish through a circuit breaker with a bounded call timeout.
// - Absorb every failure in a fallback that logs the dropped update and returns normally.

use crate::modules::workload::core::event::WorkloadEvent;
use crate::modules::workload::use_cases::publish_workload::publisher::{
    EventPublisher, PublishError,
};
use crate::shared::core::correlation::CorrelationId;
use crate::shared::infrastructure::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Dropped { reason: String },
}

pub struct GuardedEventPublisher<TPublisher>
where
    TPublisher: EventPublisher + 'static,
{
    publisher: Arc<TPublisher>,
    breaker: CircuitBreaker,
}

impl<TPublisher> GuardedEventPublisher<TPublisher>
where
    TPublisher: EventPublisher + 'static,
{
    pub fn new(publisher: Arc<TPublisher>, config: CircuitBreakerConfig) -> Self {
        Self {
            publisher,
            breaker: CircuitBreaker::new("workload-publisher", config),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn publish(
        &self,
        event: &WorkloadEvent,
        correlation_id: &CorrelationId,
    ) -> PublishOutcome {
        match self
            .breaker
            .call(self.publisher.publish(event, correlation_id))
            .await
        {
            Ok(()) => PublishOutcome::Published,
            Err(error) => self.fallback(event, correlation_id, error),
        }
    }

    fn fallback(
        &self,
        event: &WorkloadEvent,
        correlation_id: &CorrelationId,
        error: CircuitBreakerError<PublishError>,
    ) -> PublishOutcome {
        let reason = error.to_string();
        tracing::error!(
            trainer_username = %event.trainer_username,
            transaction_id = %correlation_id,
            action = ?event.action,
            duration_minutes = event.duration_minutes,
            breaker_state = ?self.breaker.state(),
            %reason,
            "workload update dropped"
        );
        PublishOutcome::Dropped { reason }
    }
}
