use crate::modules::workload::core::event::WorkloadEvent;
use crate::shared::core::correlation::CorrelationId;
use crate::shared::infrastructure::message_channel::ChannelError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode workload event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Hands a validated workload event to the broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        event: &WorkloadEvent,
        correlation_id: &CorrelationId,
    ) -> Result<(), PublishError>;
}
