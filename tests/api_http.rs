// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /tenders (stubbed transport; JSON shape + sort contract)
// - GET /tenders?keywords= override

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use licita_radar::api::{create_router, AppState};
use licita_radar::ingest::types::DocumentFetcher;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Stub transport keyed off the production feed URLs: perfiles and menores
/// answer with fixtures, plataformas agregadas stays dark.
struct StubFetcher;

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch_document(&self, url: &str) -> Option<String> {
        if url.contains("licitacionesPerfiles") {
            Some(include_str!("fixtures/perfiles.atom").to_string())
        } else if url.contains("contratosMenores") {
            Some(include_str!("fixtures/menores.atom").to_string())
        } else {
            None
        }
    }
}

/// Build the same Router the binary uses, minus the live transport.
fn test_router(keywords: Vec<String>) -> Router {
    let state = AppState {
        fetcher: Arc::new(StubFetcher),
        keywords: Arc::new(keywords),
    };
    create_router(state)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(Vec::new());

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "ok", "health body should be 'ok'");
}

#[tokio::test]
async fn api_tenders_returns_sorted_camel_case_records() {
    let app = test_router(vec!["limpieza".to_string()]);

    let req = Request::builder()
        .method("GET")
        .uri("/tenders")
        .body(Body::empty())
        .expect("build GET /tenders");

    let resp = app.oneshot(req).await.expect("oneshot /tenders");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json: Json = serde_json::from_slice(&bytes).expect("json body");
    let records = json.as_array().expect("array body");
    assert_eq!(records.len(), 8, "two live feeds worth of records");

    let first = &records[0];
    assert_eq!(
        first["id"].as_str().unwrap(),
        "https://contrataciondelestado.es/licitacion/2025-001234",
        "index 0 must be the newest record"
    );
    assert_eq!(first["contractType"], "Servicios");
    assert_eq!(first["sourceType"], "perfiles");
    assert_eq!(first["isRead"], false);
    assert_eq!(first["amount"], "40.631,78 €");
    assert_eq!(
        first["keywordsFound"].as_array().unwrap().len(),
        1,
        "configured keyword should tag the first record"
    );
}

#[tokio::test]
async fn api_tenders_accepts_keyword_override() {
    let app = test_router(vec!["limpieza".to_string()]);

    let req = Request::builder()
        .method("GET")
        .uri("/tenders?keywords=asfaltado,%20asfaltado")
        .body(Body::empty())
        .expect("build GET /tenders with override");

    let resp = app.oneshot(req).await.expect("oneshot /tenders");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json: Json = serde_json::from_slice(&bytes).expect("json body");

    let tagged: Vec<&Json> = json
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| !r["keywordsFound"].as_array().unwrap().is_empty())
        .collect();
    assert_eq!(tagged.len(), 1, "only the asfaltado record should match");
    assert_eq!(tagged[0]["keywordsFound"][0], "asfaltado");
}
