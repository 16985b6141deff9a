use std::sync::Arc;

use anyhow::Result;

use lastmile_server::admission::AdmissionControl;
use lastmile_server::config::Config;
use lastmile_server::http::{self, AppState};
use lastmile_server::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("lastmile={}", config.log_level).parse()?)
                .add_directive(format!("lastmile_server={}", config.log_level).parse()?),
        )
        .init();

    // Connect to PostgreSQL and run pending migrations
    let store = PgStore::connect(&config.database.url, config.database.max_connections).await?;
    store.health_check().await?;

    // One token bucket per guarded operation, alive for the process lifetime
    let admission = AdmissionControl::new(config.limiter.capacity, config.limiter.refill_rate);
    tracing::info!(
        "Admission control: burst {} / {} tokens per second for each operation",
        config.limiter.capacity,
        config.limiter.refill_rate
    );

    let state = AppState::new(Arc::new(store), admission);
    let app = http::router(state);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
