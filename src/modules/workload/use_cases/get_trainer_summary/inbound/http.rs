use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::modules::workload::use_cases::get_trainer_summary::handler::QueryError;
use crate::shared::core::requester::AuthenticatedUser;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    Path(username): Path<String>,
    requester: AuthenticatedUser,
) -> impl IntoResponse {
    match state.summaries.get_summary(&username, &requester).await {
        Ok(summary) => Json(summary).into_response(),
        Err(QueryError::Forbidden { .. }) => StatusCode::FORBIDDEN.into_response(),
        Err(QueryError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(QueryError::Store(error)) => {
            tracing::warn!(trainer_username = %username, %error, "summary store unavailable");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
