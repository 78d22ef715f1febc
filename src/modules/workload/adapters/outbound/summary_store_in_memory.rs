// In memory implementation of the SummaryStore port.
//
// Purpose
// - Support aggregator, consumer and query tests and local development without a database.
//
// Responsibilities
// - Store one summary document per trainer username.
// - Enforce optimistic concurrency by checking the expected version on every put.

use crate::modules::workload::core::ports::{StoredSummary, SummaryStore, SummaryStoreError};
use crate::modules::workload::core::summary::TrainerSummary;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySummaryStore {
    documents: RwLock<HashMap<String, StoredSummary>>,
    is_offline: AtomicBool,
    delay_put_ms: AtomicU64,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    /// Delays every put before the version check, widening the read-modify-write window.
    pub fn set_delay_put_ms(&self, ms: u64) {
        self.delay_put_ms.store(ms, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn ensure_online(&self) -> Result<(), SummaryStoreError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(SummaryStoreError::Backend("Summary store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn get(&self, trainer_username: &str) -> Result<Option<StoredSummary>, SummaryStoreError> {
        self.ensure_online()?;
        Ok(self.documents.read().await.get(trainer_username).cloned())
    }

    async fn put(
        &self,
        summary: TrainerSummary,
        expected_version: i64,
    ) -> Result<i64, SummaryStoreError> {
        self.ensure_online()?;
        let delay = self.delay_put_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut guard = self.documents.write().await;
        let actual = guard
            .get(&summary.trainer_username)
            .map(|stored| stored.version)
            .unwrap_or(0);
        if actual != expected_version {
            return Err(SummaryStoreError::VersionMismatch {
                trainer_username: summary.trainer_username,
                expected: expected_version,
                actual,
            });
        }
        let version = actual + 1;
        guard.insert(
            summary.trainer_username.clone(),
            StoredSummary { summary, version },
        );
        Ok(version)
    }
}
