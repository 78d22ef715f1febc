// Workload aggregator orchestrates the read-modify-write of one trainer summary.
//
// Responsibilities
// - Load the trainer's summary, or start an empty one on first sight.
// - Fold the event into it with the pure evolve function.
// - Replace the stored document, naming the version it was derived from.
// - On a conflicting concurrent write, start over from a fresh read.

use crate::modules::workload::core::event::{ValidationError, WorkloadEvent};
use crate::modules::workload::core::evolve::evolve;
use crate::modules::workload::core::ports::{SummaryStore, SummaryStoreError};
use crate::modules::workload::core::summary::TrainerSummary;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 10;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] SummaryStoreError),

    #[error("gave up on {trainer_username} after {attempts} conflicting writes")]
    ConflictRetriesExhausted {
        trainer_username: String,
        attempts: u32,
    },
}

impl AggregateError {
    /// Whether trying the same event again later may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, AggregateError::Invalid(_))
    }
}

pub struct WorkloadAggregator<TStore>
where
    TStore: SummaryStore + 'static,
{
    store: Arc<TStore>,
    max_conflict_retries: u32,
}

impl<TStore> WorkloadAggregator<TStore>
where
    TStore: SummaryStore + 'static,
{
    pub fn new(store: Arc<TStore>) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn with_max_conflict_retries(mut self, max_conflict_retries: u32) -> Self {
        self.max_conflict_retries = max_conflict_retries;
        self
    }

    pub async fn apply(&self, event: &WorkloadEvent) -> Result<TrainerSummary, AggregateError> {
        event.validate()?;

        let mut conflicts = 0;
        loop {
            let (current, version) = match self.store.get(&event.trainer_username).await? {
                Some(stored) => (stored.summary, stored.version),
                None => (TrainerSummary::empty(&event.trainer_username), 0),
            };
            let next = evolve(current, event);

            match self.store.put(next.clone(), version).await {
                Ok(new_version) => {
                    tracing::debug!(
                        trainer_username = %event.trainer_username,
                        year = event.year(),
                        month = event.month(),
                        delta = event.delta_minutes(),
                        version = new_version,
                        "workload applied"
                    );
                    return Ok(next);
                }
                Err(SummaryStoreError::VersionMismatch { .. })
                    if conflicts < self.max_conflict_retries =>
                {
                    conflicts += 1;
                    tracing::debug!(
                        trainer_username = %event.trainer_username,
                        conflicts,
                        "concurrent write on trainer summary, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                Err(SummaryStoreError::VersionMismatch { .. }) => {
                    return Err(AggregateError::ConflictRetriesExhausted {
                        trainer_username: event.trainer_username.clone(),
                        attempts: conflicts + 1,
                    });
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}
