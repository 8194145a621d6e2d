mod api;
mod doc;
mod router;
mod state;

use std::sync::Arc;

use tracing::info;

use affinity_compute::ProfileEncoder;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    affinity_core::config::load_dotenv();
    let config = affinity_core::Config::from_env();
    config.log_summary();

    let encoder = ProfileEncoder::new(config.encoder.dimensions);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState { config, encoder });
    let app = router::build_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
