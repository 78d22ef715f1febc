// In memory implementation of the MessageChannel port.
//
// Purpose
// - Connect producer and consumer inside one process for local development and tests.
//
// Responsibilities
// - Route every envelope to a partition chosen by hashing its key, so one key is
//   always consumed by one worker in send order.
// - Buffer up to `capacity` envelopes per partition while consumers are busy or down.
// - Redeliver transient failures with backoff before any newer envelope of the same
//   partition, and dead-letter permanent failures or exhausted retries.
//
// Boundaries
// - The dead-letter list is an inspection sink for tests and local runs. It keeps the
//   most recent `DEAD_LETTER_CAPACITY` entries and drops the oldest beyond that.

use crate::shared::infrastructure::message_channel::redelivery::RedeliveryPolicy;
use crate::shared::infrastructure::message_channel::{
    ChannelError, DeadLetter, Delivery, Envelope, MessageChannel, Settlement,
};
use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};

pub const DEAD_LETTER_CAPACITY: usize = 1024;

#[derive(Debug)]
struct DeadLetterBuffer {
    entries: VecDeque<DeadLetter>,
    capacity: usize,
}

impl DeadLetterBuffer {
    fn push(&mut self, dead_letter: DeadLetter) {
        while self.entries.len() >= self.capacity.max(1) {
            if let Some(dropped) = self.entries.pop_front() {
                tracing::warn!(
                    key = %dropped.envelope.key,
                    reason = %dropped.reason,
                    "dead-letter list full, dropping the oldest entry"
                );
            }
        }
        self.entries.push_back(dead_letter);
    }
}

pub struct InMemoryMessageChannel {
    senders: Vec<mpsc::Sender<Envelope>>,
    dead_letters: Arc<Mutex<DeadLetterBuffer>>,
    is_offline: AtomicBool,
}

impl InMemoryMessageChannel {
    pub fn new(
        partitions: usize,
        capacity: usize,
        policy: RedeliveryPolicy,
    ) -> (Self, Vec<PartitionReceiver>) {
        let dead_letters = Arc::new(Mutex::new(DeadLetterBuffer {
            entries: VecDeque::new(),
            capacity: DEAD_LETTER_CAPACITY,
        }));
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..partitions.max(1))
            .map(|partition| {
                let (sender, receiver) = mpsc::channel(capacity.max(1));
                let receiver = PartitionReceiver {
                    partition,
                    receiver,
                    pending: None,
                    policy,
                    dead_letters: dead_letters.clone(),
                };
                (sender, receiver)
            })
            .unzip();
        let channel = Self {
            senders,
            dead_letters,
            is_offline: AtomicBool::new(false),
        };
        (channel, receivers)
    }

    pub fn partitions(&self) -> usize {
        self.senders.len()
    }

    pub fn partition_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }

    pub fn set_offline(&self, offline: bool) {
        self.is_offline.store(offline, Ordering::SeqCst);
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().await.entries.iter().cloned().collect()
    }

    /// Bounds how many dead letters are kept. Existing overflow is dropped on the next push.
    pub async fn set_dead_letter_capacity(&self, capacity: usize) {
        self.dead_letters.lock().await.capacity = capacity;
    }
}

#[async_trait::async_trait]
impl MessageChannel for InMemoryMessageChannel {
    async fn send(&self, envelope: Envelope) -> Result<(), ChannelError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(ChannelError::Unavailable);
        }
        let partition = self.partition_for(&envelope.key);
        let sender = self
            .senders
            .get(partition)
            .ok_or(ChannelError::Unavailable)?;
        sender.try_send(envelope).map_err(|error| match error {
            TrySendError::Full(_) => ChannelError::Full { partition },
            TrySendError::Closed(_) => ChannelError::Closed { partition },
        })
    }
}

/// Consumer end of one partition. Owned by exactly one worker.
pub struct PartitionReceiver {
    partition: usize,
    receiver: mpsc::Receiver<Envelope>,
    pending: Option<Delivery>,
    policy: RedeliveryPolicy,
    dead_letters: Arc<Mutex<DeadLetterBuffer>>,
}

impl PartitionReceiver {
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Next delivery, redeliveries first. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        if let Some(delivery) = self.pending.take() {
            return Some(delivery);
        }
        self.receiver
            .recv()
            .await
            .map(|envelope| Delivery {
                envelope,
                attempt: 1,
            })
    }

    pub async fn settle(&mut self, delivery: Delivery, settlement: Settlement) {
        match settlement {
            Settlement::Ack => {
                tracing::debug!(
                    partition = self.partition,
                    key = %delivery.envelope.key,
                    attempt = delivery.attempt,
                    "delivery acknowledged"
                );
            }
            Settlement::Retry(reason) if self.policy.is_exhausted(delivery.attempt) => {
                tracing::error!(
                    partition = self.partition,
                    key = %delivery.envelope.key,
                    attempt = delivery.attempt,
                    %reason,
                    "redelivery attempts exhausted, dead-lettering"
                );
                self.dead_letter(delivery, format!("retries exhausted: {reason}"))
                    .await;
            }
            Settlement::Retry(reason) => {
                let delay = self.policy.delay_for_attempt(delivery.attempt);
                tracing::warn!(
                    partition = self.partition,
                    key = %delivery.envelope.key,
                    attempt = delivery.attempt,
                    ?delay,
                    %reason,
                    "delivery failed, scheduling redelivery"
                );
                tokio::time::sleep(delay).await;
                self.pending = Some(Delivery {
                    envelope: delivery.envelope,
                    attempt: delivery.attempt + 1,
                });
            }
            Settlement::Reject(reason) => {
                tracing::error!(
                    partition = self.partition,
                    key = %delivery.envelope.key,
                    attempt = delivery.attempt,
                    %reason,
                    "delivery rejected, dead-lettering"
                );
                self.dead_letter(delivery, reason).await;
            }
        }
    }

    async fn dead_letter(&self, delivery: Delivery, reason: String) {
        self.dead_letters.lock().await.push(DeadLetter {
            envelope: delivery.envelope,
            reason,
            attempts: delivery.attempt,
        });
    }
}

#[cfg(test)]
mod in_memory_message_channel_tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::time::Duration;

    const POLICY: RedeliveryPolicy = RedeliveryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
    };

    #[fixture]
    fn single_partition() -> (InMemoryMessageChannel, PartitionReceiver) {
        let (channel, mut receivers) = InMemoryMessageChannel::new(1, 8, POLICY);
        let receiver = receivers.remove(0);
        (channel, receiver)
    }

    fn envelope(key: &str, body: &str) -> Envelope {
        Envelope::new(key, body.as_bytes().to_vec())
    }

    #[rstest]
    fn it_should_route_a_key_to_the_same_partition_every_time() {
        let (channel, receivers) = InMemoryMessageChannel::new(4, 8, POLICY);
        assert_eq!(receivers.len(), 4);
        let first = channel.partition_for("jane.doe");
        for _ in 0..10 {
            assert_eq!(channel.partition_for("jane.doe"), first);
        }
        assert!(first < channel.partitions());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_deliver_envelopes_of_one_key_in_send_order() {
        let (channel, mut receivers) = InMemoryMessageChannel::new(4, 8, POLICY);
        for body in ["1", "2", "3"] {
            channel.send(envelope("jane.doe", body)).await.unwrap();
        }
        let receiver = &mut receivers[channel.partition_for("jane.doe")];
        for expected in ["1", "2", "3"] {
            let delivery = receiver.recv().await.unwrap();
            assert_eq!(delivery.envelope.payload, expected.as_bytes());
            assert_eq!(delivery.attempt, 1);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_to_send_while_offline(
        single_partition: (InMemoryMessageChannel, PartitionReceiver),
    ) {
        let (channel, _receiver) = single_partition;
        channel.set_offline(true);
        assert_eq!(
            channel.send(envelope("jane.doe", "1")).await,
            Err(ChannelError::Unavailable)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_fast_when_the_partition_is_full() {
        let (channel, _receivers) = InMemoryMessageChannel::new(1, 1, POLICY);
        channel.send(envelope("jane.doe", "1")).await.unwrap();
        assert_eq!(
            channel.send(envelope("jane.doe", "2")).await,
            Err(ChannelError::Full { partition: 0 })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_when_the_consumer_is_gone(
        single_partition: (InMemoryMessageChannel, PartitionReceiver),
    ) {
        let (channel, receiver) = single_partition;
        drop(receiver);
        assert_eq!(
            channel.send(envelope("jane.doe", "1")).await,
            Err(ChannelError::Closed { partition: 0 })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_redeliver_a_retried_envelope_before_newer_ones(
        single_partition: (InMemoryMessageChannel, PartitionReceiver),
    ) {
        let (channel, mut receiver) = single_partition;
        channel.send(envelope("jane.doe", "1")).await.unwrap();
        channel.send(envelope("jane.doe", "2")).await.unwrap();

        let first = receiver.recv().await.unwrap();
        receiver
            .settle(first, Settlement::Retry("store offline".into()))
            .await;

        let redelivered = receiver.recv().await.unwrap();
        assert_eq!(redelivered.envelope.payload, b"1");
        assert_eq!(redelivered.attempt, 2);
        assert!(redelivered.is_redelivery());
        receiver.settle(redelivered, Settlement::Ack).await;

        let next = receiver.recv().await.unwrap();
        assert_eq!(next.envelope.payload, b"2");
        assert!(channel.dead_letters().await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_dead_letter_once_redeliveries_are_exhausted(
        single_partition: (InMemoryMessageChannel, PartitionReceiver),
    ) {
        let (channel, mut receiver) = single_partition;
        channel.send(envelope("jane.doe", "1")).await.unwrap();

        for _ in 0..POLICY.max_attempts {
            let delivery = receiver.recv().await.unwrap();
            receiver
                .settle(delivery, Settlement::Retry("store offline".into()))
                .await;
        }

        let dead_letters = channel.dead_letters().await;
        assert_eq!(dead_letters.len(), 1);
        assert_eq!(dead_letters[0].attempts, POLICY.max_attempts);
        assert_eq!(dead_letters[0].reason, "retries exhausted: store offline");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_dead_letter_a_rejected_envelope_without_redelivery(
        single_partition: (InMemoryMessageChannel, PartitionReceiver),
    ) {
        let (channel, mut receiver) = single_partition;
        channel.send(envelope("jane.doe", "not-json")).await.unwrap();
        channel.send(envelope("jane.doe", "2")).await.unwrap();

        let delivery = receiver.recv().await.unwrap();
        receiver
            .settle(delivery, Settlement::Reject("malformed".into()))
            .await;

        let next = receiver.recv().await.unwrap();
        assert_eq!(next.envelope.payload, b"2");
        let dead_letters = channel.dead_letters().await;
        assert_eq!(dead_letters.len(), 1);
        assert_eq!(dead_letters[0].attempts, 1);
        assert_eq!(dead_letters[0].envelope.payload, b"not-json");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_only_the_most_recent_dead_letters(
        single_partition: (InMemoryMessageChannel, PartitionReceiver),
    ) {
        let (channel, mut receiver) = single_partition;
        channel.set_dead_letter_capacity(2).await;
        for body in ["1", "2", "3"] {
            channel.send(envelope("jane.doe", body)).await.unwrap();
            let delivery = receiver.recv().await.unwrap();
            receiver
                .settle(delivery, Settlement::Reject("malformed".into()))
                .await;
        }

        let payloads: Vec<Vec<u8>> = channel
            .dead_letters()
            .await
            .into_iter()
            .map(|dead_letter| dead_letter.envelope.payload)
            .collect();
        assert_eq!(payloads, vec![b"2".to_vec(), b"3".to_vec()]);
    }
}
