// Ports define what the workload core needs from the outside world, without implementing it.
//
// Responsibilities
// - Keep the aggregator and query service independent of any document database.
//
// Concurrency
// - Every stored summary carries a version. A write names the version it was derived
//   from and fails with VersionMismatch if another writer got there first. This makes
//   the read-modify-write of one trainer atomic without a global lock.

use crate::modules::workload::core::summary::TrainerSummary;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummaryStoreError {
    #[error("version mismatch for {trainer_username}: expected {expected}, actual {actual}")]
    VersionMismatch {
        trainer_username: String,
        expected: i64,
        actual: i64,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSummary {
    pub summary: TrainerSummary,
    /// Number of writes applied to this document. 0 means it was never written.
    pub version: i64,
}

#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn get(&self, trainer_username: &str) -> Result<Option<StoredSummary>, SummaryStoreError>;

    /// Replaces the whole document, returning its new version.
    async fn put(
        &self,
        summary: TrainerSummary,
        expected_version: i64,
    ) -> Result<i64, SummaryStoreError>;
}
