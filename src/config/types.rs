//! Core configuration types for the indexing pipeline.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One configured seed site (spec.md §6 `sites` list).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    pub url: String,
    pub name: String,
}

/// The full set of tunables named in spec.md §6, plus the file-extension
/// filter used by the Fetcher (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// `indexing-settings.fork-join-pool.parallelism`
    pub parallelism: usize,
    /// `indexing-settings.batchSize`
    pub batch_size: usize,
    /// `sites`
    pub sites: Vec<SiteConfig>,

    /// `pageUrlCache.max`
    pub page_url_cache_max: usize,
    /// `pageUrlCache.idle_ttl`
    #[serde(with = "humantime_secs")]
    pub page_url_cache_idle_ttl: Duration,

    /// `lemmaCache.max`
    pub lemma_cache_max: usize,
    /// `lemmaCache.idle_ttl`
    #[serde(with = "humantime_secs")]
    pub lemma_cache_idle_ttl: Duration,

    /// Fetch connect timeout (spec.md §5: default 10s connect).
    pub connect_timeout_secs: u64,
    /// Fetch read timeout (spec.md §5: default 30s read).
    pub read_timeout_secs: u64,

    /// Safety ceiling on how long a site's task drain may take before the
    /// Coordinator records `POOL_TERMINATION_FORCED` (spec.md §5). The spec
    /// calls for no real deadline; this bounds worst-case test/run time only.
    pub pool_drain_timeout_secs: u64,

    /// Binary/media extensions the Fetcher skips without a network call
    /// (spec.md §4.2). Stored lowercase, without the leading dot.
    pub binary_extensions: HashSet<String>,

    /// SQLite database path (not part of the original spec's enumerated
    /// config, but needed to open the Page Store).
    pub database_path: String,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallelism: 8,
            batch_size: 5000,
            sites: Vec::new(),
            page_url_cache_max: 600,
            page_url_cache_idle_ttl: Duration::from_secs(600),
            lemma_cache_max: 10_000,
            lemma_cache_idle_ttl: Duration::from_secs(600),
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            pool_drain_timeout_secs: 120,
            binary_extensions: default_binary_extensions(),
            database_path: "site_indexer.sqlite".to_string(),
        }
    }
}

/// Default binary/media extension list from spec.md §4.2.
#[must_use]
pub fn default_binary_extensions() -> HashSet<String> {
    [
        "pdf", "png", "jpg", "jpeg", "gif", "bmp", "tiff", "svg", "webp", "mp4", "avi", "mkv",
        "mov", "wmv", "flv", "mp3", "wav", "aac", "flac", "ogg", "zip", "rar", "7z", "tar", "gz",
        "exe", "dmg", "iso", "apk", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Serializes a `Duration` as whole seconds, for a config file format that
/// reads naturally as `lemma_cache_idle_ttl = 600`.
mod humantime_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(de)?;
        Ok(Duration::from_secs(secs))
    }
}
