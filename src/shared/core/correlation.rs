// Correlation identifier carried alongside a workload event.
//
// Purpose
// - Tie the CRM request that produced an event to the consumer logs that applied it.
//
// Boundaries
// - Observability only. Never used to deduplicate or order messages.

use axum::http::HeaderMap;
use std::fmt;
use uuid::Uuid;

/// HTTP header the caller uses to hand us its transaction id.
pub const TRANSACTION_ID_HEADER: &str = "x-transaction-id";

/// Key of the channel metadata entry holding the transaction id.
pub const TRANSACTION_ID_METADATA: &str = "transactionId";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Reuses the caller's transaction id when it sent a usable one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(TRANSACTION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Self::new)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
