// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// Which of the three upstream syndication feeds produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "perfiles")]
    PerfilesContratante,
    #[serde(rename = "agregadas")]
    PlataformasAgregadas,
    #[serde(rename = "menores")]
    ContratosMenores,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PerfilesContratante => "Perfiles Contratante",
            Self::PlataformasAgregadas => "Plataformas Agregadas",
            Self::ContratosMenores => "Contratos Menores",
        }
    }
}

/// Coarse procurement category. Every record gets exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    Servicios,
    Suministros,
    Obras,
    Otros,
}

/// Canonical structured unit handed to the dashboard. Built once per feed
/// entry per fetch cycle, never mutated afterwards; read/favorite state is
/// tracked by the presentation layer, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderRecord {
    pub id: String,
    pub title: String,
    /// Tag-stripped description, capped at 300 chars plus ellipsis.
    pub summary: String,
    pub link: String,
    /// RFC 3339; ingestion time when the feed omits it.
    pub updated: String,
    /// Display-formatted, e.g. "40.631,78 €". Absent when no rule matched.
    pub amount: Option<String>,
    pub organism: Option<String>,
    pub contract_type: ContractType,
    pub source_type: SourceKind,
    pub keywords_found: Vec<String>,
    pub is_read: bool,
}

/// One configured upstream feed endpoint.
#[derive(Debug, Clone, Copy)]
pub struct FeedSource {
    pub kind: SourceKind,
    pub url: &'static str,
}

#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Retrieve the raw feed document behind `url`, or `None` once every
    /// route to it has failed.
    async fn fetch_document(&self, url: &str) -> Option<String>;
}
