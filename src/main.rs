//! Tender Feed Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the relay transport, keyword
//! configuration, routes, and middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use licita_radar::api::{self, AppState};
use licita_radar::config;
use licita_radar::ingest::{transport::RelayTransport, FEED_SOURCES};
use licita_radar::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments. This enables
    // TENDER_KEYWORDS_PATH / PORT overrides without exporting them.
    let _ = dotenvy::dotenv();

    init_tracing();

    let keywords = config::load_keywords_default().unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "keyword config unreadable, starting with empty list");
        Vec::new()
    });
    tracing::info!(
        keywords = keywords.len(),
        feeds = FEED_SOURCES.len(),
        "starting tender feed service"
    );

    let metrics = Metrics::init(FEED_SOURCES.len());
    let transport = RelayTransport::new()?;

    let state = AppState {
        fetcher: Arc::new(transport),
        keywords: Arc::new(keywords),
    };
    let router = api::create_router(state).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
