// EventPublisher adapter writing workload events onto a MessageChannel.
//
// Responsibilities
// - Serialize the event to its JSON wire payload.
// - Key the envelope by trainer username so one trainer stays on one partition.
// - Carry the transaction id as channel metadata, never inside the payload.

use crate::modules::workload::core::event::WorkloadEvent;
use crate::modules::workload::use_cases::publish_workload::publisher::{
    EventPublisher, PublishError,
};
use crate::shared::core::correlation::{CorrelationId, TRANSACTION_ID_METADATA};
use crate::shared::infrastructure::message_channel::{Envelope, MessageChannel};
use async_trait::async_trait;
use std::sync::Arc;

pub fn encode_envelope(
    event: &WorkloadEvent,
    correlation_id: &CorrelationId,
) -> Result<Envelope, PublishError> {
    let payload = serde_json::to_vec(&event.to_payload())?;
    Ok(Envelope::new(event.trainer_username.clone(), payload)
        .with_header(TRANSACTION_ID_METADATA, correlation_id.as_str()))
}

pub struct ChannelEventPublisher<TChannel>
where
    TChannel: MessageChannel + 'static,
{
    channel: Arc<TChannel>,
}

impl<TChannel> ChannelEventPublisher<TChannel>
where
    TChannel: MessageChannel + 'static,
{
    pub fn new(channel: Arc<TChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl<TChannel> EventPublisher for ChannelEventPublisher<TChannel>
where
    TChannel: MessageChannel + 'static,
{
    async fn publish(
        &self,
        event: &WorkloadEvent,
        correlation_id: &CorrelationId,
    ) -> Result<(), PublishError> {
        let envelope = encode_envelope(event, correlation_id)?;
        self.channel.send(envelope).await?;
        tracing::debug!(
            trainer_username = %event.trainer_username,
            transaction_id = %correlation_id,
            "workload event published"
        );
        Ok(())
    }
}
