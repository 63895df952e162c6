//! Fluent builder for [`IndexingConfig`], for tests and programmatic embedders.
//!
//! The teacher crate uses a type-state builder because `CrawlConfig` has
//! hard-required fields (a start URL, a storage directory). `IndexingConfig`
//! has no such requirement — every field has a sane default — so a plain
//! fluent builder is the right amount of ceremony here.

use std::time::Duration;

use super::types::{IndexingConfig, SiteConfig};

#[derive(Debug, Default)]
pub struct IndexingConfigBuilder {
    config: IndexingConfig,
}

impl IndexingConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: IndexingConfig::default(),
        }
    }

    #[must_use]
    pub fn parallelism(mut self, n: usize) -> Self {
        self.config.parallelism = n.max(1);
        self
    }

    #[must_use]
    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n.max(1);
        self
    }

    #[must_use]
    pub fn site(mut self, url: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.sites.push(SiteConfig {
            url: url.into(),
            name: name.into(),
        });
        self
    }

    #[must_use]
    pub fn sites(mut self, sites: Vec<SiteConfig>) -> Self {
        self.config.sites = sites;
        self
    }

    #[must_use]
    pub fn lemma_cache_max(mut self, n: usize) -> Self {
        self.config.lemma_cache_max = n;
        self
    }

    #[must_use]
    pub fn page_url_cache_max(mut self, n: usize) -> Self {
        self.config.page_url_cache_max = n;
        self
    }

    #[must_use]
    pub fn cache_idle_ttl(mut self, ttl: Duration) -> Self {
        self.config.page_url_cache_idle_ttl = ttl;
        self.config.lemma_cache_idle_ttl = ttl;
        self
    }

    #[must_use]
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.config.database_path = path.into();
        self
    }

    #[must_use]
    pub fn build(self) -> IndexingConfig {
        self.config
    }
}
