// Message channel port between the workload producer and its consumers.
//
// Purpose
// - Move opaque serialized payloads from one process to one logical consumer group.
//
// Responsibilities
// - Accept an envelope without blocking the sender on consumer progress.
// - Deliver at least once. A delivery is only done when the consumer settles it.
//
// Boundaries
// - The channel never looks inside the payload. Partitioning uses the envelope key only.

pub mod in_memory;
pub mod redelivery;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Partition key. Envelopes sharing a key are delivered in send order.
    pub key: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            headers: BTreeMap::new(),
            payload,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("message channel unavailable")]
    Unavailable,

    #[error("partition {partition} is full")]
    Full { partition: usize },

    #[error("partition {partition} has no consumer")]
    Closed { partition: usize },
}

#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<(), ChannelError>;
}

/// One attempt at handing an envelope to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub envelope: Envelope,
    /// 1 for the first delivery, incremented on every redelivery.
    pub attempt: u32,
}

impl Delivery {
    pub fn is_redelivery(&self) -> bool {
        self.attempt > 1
    }
}

/// How a consumer finished with a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    /// Transient failure. Redeliver after backoff.
    Retry(String),
    /// Permanent failure. Never redeliver.
    Reject(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub envelope: Envelope,
    pub reason: String,
    pub attempts: u32,
}
