//! Fetcher (C2): the only component that touches the network.
//!
//! The contract is deliberately small — `fetch(url) -> (status, final_url,
//! document)` — so the Crawl Scheduler and Re-indexer can share one trait
//! object and tests can substitute a mock without spinning up a server.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{IndexError, IndexResult};

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status_code: u16,
    pub final_url: String,
    pub document: String,
}

/// Schemes the Fetcher will follow. Everything else (`mailto:`,
/// `javascript:`, `ftp:`, `file:`, ...) is pre-filtered by the caller
/// (spec.md §4.2) before `fetch` is ever invoked.
#[must_use]
pub fn is_supported_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https")
}

/// True if `url`'s path ends with one of the configured binary/media
/// extensions — these are skipped without a network call (spec.md §4.2).
#[must_use]
pub fn is_binary_url(url: &str, binary_extensions: &HashSet<String>) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_ascii_lowercase();
    match path.rsplit_once('.') {
        Some((_, ext)) => binary_extensions.contains(ext),
        None => false,
    }
}

/// The Fetcher contract. Implementations surface I/O failure as
/// `IndexError::Io` and must never follow redirects outside `http`/`https`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> IndexResult<FetchResult>;
}

/// `reqwest`-backed Fetcher with a connect and a read timeout, matching
/// spec.md §5's default of 10s connect / 30s read.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> IndexResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent("site-indexer/0.1")
            .build()
            .map_err(|e| IndexError::Io(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> IndexResult<FetchResult> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IndexError::Io(e.to_string()))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().as_str().to_string();
        let document = response
            .text()
            .await
            .map_err(|e| IndexError::Io(e.to_string()))?;

        Ok(FetchResult {
            status_code,
            final_url,
            document,
        })
    }
}
