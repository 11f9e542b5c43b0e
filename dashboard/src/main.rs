use std::sync::Arc;

use anyhow::Result;
use dashboard::{router, AppState};
use shared::{Config, Dashboard, StockReportClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Stock Report dashboard...");

    let config = Config::from_env()?;
    info!("Backend API: {}", config.api_base_url);
    info!("Time zone: {}", config.timezone);

    let client = StockReportClient::new(config.api_base_url.clone());
    let dashboard = Arc::new(Dashboard::new(Arc::new(client), config.timezone));
    let app = router(AppState::new(dashboard, &config));

    let listener = tokio::net::TcpListener::bind(&config.dashboard_addr).await?;
    info!("Dashboard listening on http://{}", config.dashboard_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
