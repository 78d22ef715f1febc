use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::modules::workload::use_cases::apply_workload::inbound::http as apply_http;
use crate::modules::workload::use_cases::get_trainer_summary::inbound::http as summary_http;
use crate::modules::workload::use_cases::publish_workload::inbound::http as publish_http;
use crate::shell::graphql::{self, GRAPHQL_PATH};
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    let schema = graphql::build_schema(state.clone());
    Router::new()
        .route("/workload", post(apply_http::handle))
        .route("/workload/events", post(publish_http::handle))
        .route("/workload/{username}", get(summary_http::handle))
        .route(GRAPHQL_PATH, get(graphql::graphiql).post(graphql::graphql))
        .layer(Extension(schema))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
