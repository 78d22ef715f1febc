use tracing_subscriber::{EnvFilter, fmt};

use trainer_workload::shell::config::AppConfig;
use trainer_workload::shell::http::router;
use trainer_workload::shell::state::AppState;
use trainer_workload::shell::workers::spawn_partition_workers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // In-memory deps for now
    let (state, receivers) = AppState::in_memory(&config);
    let workers = spawn_partition_workers(state.consumer.clone(), receivers);
    tracing::info!(partitions = workers.len(), "workload consumers running");

    let app = router(state);
    tracing::info!("Workload API: http://{}/workload", config.http_addr);
    tracing::info!("GraphQL endpoint: http://{}/gql", config.http_addr);
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
