// Producer-side entry point: what the CRM calls once a training mutation is committed.
//
// Responsibilities
// - Validate the payload on the producer side before it leaves the process.
// - Publish exactly one workload event per call through the resilience guard.
//
// Boundaries
// - Call only after the training mutation is durably committed.
// - Broker trouble never surfaces here. Only an invalid payload is an error.

use crate::modules::workload::core::event::{ValidationError, WorkloadEventPayload};
use crate::modules::workload::use_cases::publish_workload::guarded::{
    GuardedEventPublisher, PublishOutcome,
};
use crate::modules::workload::use_cases::publish_workload::publisher::EventPublisher;
use crate::shared::core::correlation::CorrelationId;

pub struct PublishWorkloadHandler<TPublisher>
where
    TPublisher: EventPublisher + 'static,
{
    publisher: GuardedEventPublisher<TPublisher>,
}

impl<TPublisher> PublishWorkloadHandler<TPublisher>
where
    TPublisher: EventPublisher + 'static,
{
    pub fn new(publisher: GuardedEventPublisher<TPublisher>) -> Self {
        Self { publisher }
    }

    pub async fn handle(
        &self,
        payload: WorkloadEventPayload,
        correlation_id: &CorrelationId,
    ) -> Result<PublishOutcome, ValidationError> {
        let event = payload.into_event()?;
        Ok(self.publisher.publish(&event, correlation_id).await)
    }
}
