use axum::{
    Json, extract::State, extract::rejection::JsonRejection, http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::modules::workload::core::event::{ValidationError, WorkloadEventPayload};
use crate::modules::workload::use_cases::apply_workload::aggregator::AggregateError;
use crate::shell::state::AppState;

pub(crate) fn validation_response(error: &ValidationError) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": error.to_string(), "field": error.field() })),
    )
        .into_response()
}

/// Synchronous twin of the consumer: same payload, same aggregator path.
pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<WorkloadEventPayload>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return validation_response(&ValidationError::Malformed(rejection.body_text()));
        }
    };

    let event = match body.into_event() {
        Ok(event) => event,
        Err(error) => return validation_response(&error),
    };

    match state.aggregator.apply(&event).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(AggregateError::Invalid(error)) => validation_response(&error),
        Err(error) => {
            tracing::warn!(
                trainer_username = %event.trainer_username,
                %error,
                "workload update not applied"
            );
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
