// tests/ingest_e2e.rs
//
// Full pipeline over stub transport: one feed whose relay chain is dead,
// two live feeds, merged into a single sorted collection.

use std::sync::Arc;

use async_trait::async_trait;
use licita_radar::ingest;
use licita_radar::ingest::types::{DocumentFetcher, FeedSource, SourceKind};

const SOURCES: [FeedSource; 3] = [
    FeedSource {
        kind: SourceKind::PerfilesContratante,
        url: "https://feeds.test/perfiles.atom",
    },
    FeedSource {
        kind: SourceKind::PlataformasAgregadas,
        url: "https://feeds.test/agregadas.atom",
    },
    FeedSource {
        kind: SourceKind::ContratosMenores,
        url: "https://feeds.test/menores.atom",
    },
];

/// Serves fixtures for two feeds; the third behaves like an exhausted
/// relay chain.
struct StubFetcher;

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch_document(&self, url: &str) -> Option<String> {
        if url.contains("perfiles") {
            Some(include_str!("fixtures/perfiles.atom").to_string())
        } else if url.contains("menores") {
            Some(include_str!("fixtures/menores.atom").to_string())
        } else {
            None
        }
    }
}

#[tokio::test]
async fn dead_feed_contributes_zero_records_others_merge_sorted() {
    let keywords = vec!["limpieza".to_string(), "obras".to_string()];
    let records = ingest::ingest_all(Arc::new(StubFetcher), &SOURCES, &keywords)
        .await
        .expect("fan-out itself must not fail");

    // 5 from perfiles + 3 from menores, none from the dead feed.
    assert_eq!(records.len(), 8);
    assert!(records
        .iter()
        .all(|r| r.source_type != SourceKind::PlataformasAgregadas));

    // Descending by `updated`; index 0 is the newest (watermark contract).
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "https://contrataciondelestado.es/licitacion/2025-001234",
            "https://contrataciondelestado.es/contratoMenor/2025-009871",
            "https://contrataciondelestado.es/licitacion/2025-001198",
            "https://contrataciondelestado.es/licitacion/2025-001175",
            "https://contrataciondelestado.es/contratoMenor/2025-009803",
            "https://contrataciondelestado.es/licitacion/2025-001102",
            "https://contrataciondelestado.es/licitacion/2025-001066",
            "https://contrataciondelestado.es/contratoMenor/2025-009712",
        ]
    );
}

#[tokio::test]
async fn keywords_tag_records_across_sources() {
    let keywords = vec!["limpieza".to_string()];
    let records = ingest::ingest_all(Arc::new(StubFetcher), &SOURCES, &keywords)
        .await
        .expect("fan-out itself must not fail");

    let tagged: Vec<&str> = records
        .iter()
        .filter(|r| !r.keywords_found.is_empty())
        .map(|r| r.source_type.label())
        .collect();
    assert!(
        tagged.contains(&"Perfiles Contratante") && tagged.contains(&"Contratos Menores"),
        "limpieza appears in both live feeds, got: {tagged:?}"
    );
}

#[tokio::test]
async fn every_relay_dead_yields_an_empty_collection() {
    struct DeadFetcher;

    #[async_trait]
    impl DocumentFetcher for DeadFetcher {
        async fn fetch_document(&self, _url: &str) -> Option<String> {
            None
        }
    }

    let records = ingest::ingest_all(Arc::new(DeadFetcher), &SOURCES, &[])
        .await
        .expect("all-feeds-down is not an error");
    assert!(records.is_empty());
}
