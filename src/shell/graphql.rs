use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptyMutation, EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{Extension, http::HeaderMap, response::Html};

pub use crate::modules::workload::use_cases::get_trainer_summary::inbound::graphql::QueryRoot;
use crate::shared::core::requester::AuthenticatedUser;
pub use crate::shell::state::AppState;

pub const GRAPHQL_PATH: &str = "/gql";

pub type AppSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(state: AppState) -> AppSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(state)
        .finish()
}

/// Executes a request, handing the gateway-authenticated user to the resolvers.
pub async fn graphql(
    Extension(schema): Extension<AppSchema>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    if let Some(requester) = AuthenticatedUser::from_headers(&headers) {
        request = request.data(requester);
    }
    schema.execute(request).await.into()
}

pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}
