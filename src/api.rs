use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config;
use crate::ingest::types::{DocumentFetcher, TenderRecord};
use crate::ingest::{self, FEED_SOURCES};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn DocumentFetcher>,
    /// Keyword list loaded at startup; per-request override via query.
    pub keywords: Arc<Vec<String>>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/tenders", get(list_tenders))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct TendersQuery {
    /// Comma-separated override of the configured keyword list.
    #[serde(default)]
    keywords: Option<String>,
}

/// Full aggregation cycle: every configured feed, merged and sorted newest
/// first. Dead feeds contribute nothing; 500 only when the fan-out itself
/// breaks.
async fn list_tenders(
    State(state): State<AppState>,
    Query(q): Query<TendersQuery>,
) -> Result<Json<Vec<TenderRecord>>, StatusCode> {
    let keywords: Vec<String> = match q.keywords {
        Some(raw) => config::clean_keywords(raw.split(',').map(str::to_string).collect()),
        None => state.keywords.as_ref().clone(),
    };

    match ingest::ingest_all(Arc::clone(&state.fetcher), &FEED_SOURCES, &keywords).await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            tracing::error!(error = ?e, "aggregation fan-out failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
