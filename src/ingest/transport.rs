// src/ingest/transport.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Url;

use crate::ingest::types::DocumentFetcher;

/// Per-attempt ceiling; the relays occasionally hang instead of failing fast.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Relay endpoints tried strictly in order, each wrapping the target feed
/// URL as a query parameter. The first healthy response wins; exhausting
/// the list means "feed unavailable", never an error.
const RELAYS: [(&str, &str); 3] = [
    ("https://api.allorigins.win/raw", "url"),
    ("https://corsproxy.io/", "url"),
    ("https://api.codetabs.com/v1/proxy", "quest"),
];

pub struct RelayTransport {
    client: reqwest::Client,
}

impl RelayTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(ATTEMPT_TIMEOUT)
            .user_agent(concat!("licita-radar/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building transport client")?;
        Ok(Self { client })
    }

    fn relay_urls(target: &str) -> Vec<Url> {
        RELAYS
            .iter()
            .filter_map(|(base, param)| Url::parse_with_params(base, [(*param, target)]).ok())
            .collect()
    }
}

#[async_trait]
impl DocumentFetcher for RelayTransport {
    async fn fetch_document(&self, url: &str) -> Option<String> {
        for relay in Self::relay_urls(url) {
            let host = relay.host_str().unwrap_or("?").to_string();
            match self.client.get(relay).send().await {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(body) => return Some(body),
                    Err(e) => {
                        tracing::warn!(error = ?e, relay = %host, "relay body read failed");
                        counter!("transport_relay_errors_total").increment(1);
                    }
                },
                Ok(resp) => {
                    tracing::warn!(status = %resp.status(), relay = %host, "relay returned non-ok status");
                    counter!("transport_relay_errors_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, relay = %host, "relay request failed");
                    counter!("transport_relay_errors_total").increment(1);
                }
            }
        }
        tracing::warn!(feed = %url, "all relays exhausted");
        None
    }
}
