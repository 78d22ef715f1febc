use axum::{
    Json,
    extract::State,
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;

use crate::modules::workload::core::event::{ValidationError, WorkloadEventPayload};
use crate::modules::workload::use_cases::apply_workload::inbound::http::validation_response;
use crate::modules::workload::use_cases::publish_workload::guarded::PublishOutcome;
use crate::shared::core::correlation::CorrelationId;
use crate::shell::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishWorkloadResponse {
    pub transaction_id: String,
    pub published: bool,
}

/// Accepts the event whether or not the broker takes it. A dropped update is
/// visible in the body and in the logs, never as a failed request.
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<WorkloadEventPayload>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return validation_response(&ValidationError::Malformed(rejection.body_text()));
        }
    };

    let correlation_id = CorrelationId::from_headers(&headers);
    match state.publish_handler.handle(body, &correlation_id).await {
        Ok(outcome) => (
            StatusCode::ACCEPTED,
            Json(PublishWorkloadResponse {
                transaction_id: correlation_id.to_string(),
                published: outcome == PublishOutcome::Published,
            }),
        )
            .into_response(),
        Err(error) => validation_response(&error),
    }
}
