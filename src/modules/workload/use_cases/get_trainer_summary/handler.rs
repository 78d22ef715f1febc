// Read side of the workload context: one trainer's summary, for that trainer only.
//
// Responsibilities
// - Refuse a requester asking for someone else's summary before touching the store.
// - Tell an unknown trainer apart from a refused request.

use crate::modules::workload::core::ports::{SummaryStore, SummaryStoreError};
use crate::modules::workload::core::summary::TrainerSummary;
use crate::shared::core::requester::AuthenticatedUser;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("{requester} may not read the summary of {username}")]
    Forbidden { requester: String, username: String },

    #[error("no workload summary for {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] SummaryStoreError),
}

pub struct SummaryQueryService<TStore>
where
    TStore: SummaryStore + 'static,
{
    store: Arc<TStore>,
}

impl<TStore> SummaryQueryService<TStore>
where
    TStore: SummaryStore + 'static,
{
    pub fn new(store: Arc<TStore>) -> Self {
        Self { store }
    }

    pub async fn get_summary(
        &self,
        username: &str,
        requester: &AuthenticatedUser,
    ) -> Result<TrainerSummary, QueryError> {
        if requester.username() != username {
            tracing::warn!(
                requester = requester.username(),
                trainer_username = username,
                "refused workload summary request for another trainer"
            );
            return Err(QueryError::Forbidden {
                requester: requester.username().to_string(),
                username: username.to_string(),
            });
        }

        self.store
            .get(username)
            .await?
            .map(|stored| stored.summary)
            .ok_or_else(|| QueryError::NotFound(username.to_string()))
    }
}
