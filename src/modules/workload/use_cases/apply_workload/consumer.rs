// Workload consumer: turns channel deliveries into aggregator calls.
//
// Responsibilities
// - Decode and re-validate every payload. The producer may run another version.
// - Classify failures: an invalid message is rejected for good, an infrastructure
//   failure is handed back to the channel for redelivery.
// - Acknowledge only after the aggregator has persisted the summary.
//
// Redelivery is not deduplicated. A message delivered twice is applied twice.

use crate::modules::workload::core::event::{ValidationError, WorkloadEvent};
use crate::modules::workload::core::ports::SummaryStore;
use crate::modules::workload::core::summary::TrainerSummary;
use crate::modules::workload::use_cases::apply_workload::aggregator::{
    AggregateError, WorkloadAggregator,
};
use crate::shared::core::correlation::TRANSACTION_ID_METADATA;
use crate::shared::infrastructure::message_channel::in_memory::PartitionReceiver;
use crate::shared::infrastructure::message_channel::{Delivery, Envelope, Settlement};
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("invalid workload message: {0}")]
    Invalid(ValidationError),

    #[error("workload message not applied: {0}")]
    Transient(AggregateError),
}

impl From<ValidationError> for ConsumeError {
    fn from(error: ValidationError) -> Self {
        ConsumeError::Invalid(error)
    }
}

impl From<AggregateError> for ConsumeError {
    fn from(error: AggregateError) -> Self {
        match error {
            AggregateError::Invalid(error) => ConsumeError::Invalid(error),
            other => ConsumeError::Transient(other),
        }
    }
}

impl ConsumeError {
    pub fn settlement(&self) -> Settlement {
        match self {
            ConsumeError::Invalid(_) => Settlement::Reject(self.to_string()),
            ConsumeError::Transient(_) => Settlement::Retry(self.to_string()),
        }
    }
}

pub struct WorkloadConsumer<TStore>
where
    TStore: SummaryStore + 'static,
{
    aggregator: Arc<WorkloadAggregator<TStore>>,
}

impl<TStore> WorkloadConsumer<TStore>
where
    TStore: SummaryStore + 'static,
{
    pub fn new(aggregator: Arc<WorkloadAggregator<TStore>>) -> Self {
        Self { aggregator }
    }

    pub async fn on_message(&self, envelope: &Envelope) -> Result<TrainerSummary, ConsumeError> {
        let span = tracing::info_span!(
            "workload_message",
            transaction_id = envelope.header(TRANSACTION_ID_METADATA).unwrap_or("-"),
            trainer_username = %envelope.key,
        );
        self.apply_envelope(envelope).instrument(span).await
    }

    async fn apply_envelope(&self, envelope: &Envelope) -> Result<TrainerSummary, ConsumeError> {
        let event = WorkloadEvent::from_slice(&envelope.payload).inspect_err(|error| {
            tracing::warn!(field = error.field(), %error, "rejecting invalid workload message");
        })?;

        match self.aggregator.apply(&event).await {
            Ok(summary) => {
                tracing::info!(
                    action = ?event.action,
                    duration_minutes = event.duration_minutes,
                    year = event.year(),
                    month = event.month(),
                    "workload message applied"
                );
                Ok(summary)
            }
            Err(error) => {
                let error = ConsumeError::from(error);
                match &error {
                    ConsumeError::Invalid(invalid) => tracing::warn!(
                        field = invalid.field(),
                        %invalid,
                        "rejecting invalid workload message"
                    ),
                    ConsumeError::Transient(transient) => tracing::warn!(
                        %transient,
                        "workload message failed transiently"
                    ),
                }
                Err(error)
            }
        }
    }

    /// Processes one delivery and decides how the channel should settle it.
    pub async fn handle(&self, delivery: &Delivery) -> Settlement {
        if delivery.is_redelivery() {
            tracing::info!(
                trainer_username = %delivery.envelope.key,
                attempt = delivery.attempt,
                "processing redelivered workload message"
            );
        }
        match self.on_message(&delivery.envelope).await {
            Ok(_) => Settlement::Ack,
            Err(error) => error.settlement(),
        }
    }
}

/// Drains one partition until every producer is gone.
pub async fn run_partition_worker<TStore>(
    consumer: Arc<WorkloadConsumer<TStore>>,
    mut receiver: PartitionReceiver,
) where
    TStore: SummaryStore + 'static,
{
    let partition = receiver.partition();
    tracing::info!(partition, "workload worker started");
    while let Some(delivery) = receiver.recv().await {
        let settlement = consumer.handle(&delivery).await;
        receiver.settle(delivery, settlement).await;
    }
    tracing::info!(partition, "workload worker stopped, channel closed");
}
