//! Site Indexer (C8): the per-site lifecycle wrapper the Coordinator fans
//! out across — create or reuse the `site` row, run the crawl, and record
//! the outcome as `INDEXED` or `FAILED` (spec.md §4.8).
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::errors::{IndexError, IndexResult};
use crate::model::SiteStatus;
use crate::scheduler::CrawlScheduler;
use crate::store::PageStore;

pub struct SiteIndexer {
    store: Arc<PageStore>,
    scheduler: CrawlScheduler,
}

impl SiteIndexer {
    #[must_use]
    pub fn new(store: Arc<PageStore>, scheduler: CrawlScheduler) -> Self {
        Self { store, scheduler }
    }

    /// Run one site to completion, recording its terminal status. Never
    /// per-site `reset_all` (spec.md §4.8's policy-(b) fix) — that truncate
    /// happens exactly once, in the Coordinator, before any site starts.
    pub async fn index_site(&self, config: &SiteConfig, stop: Arc<AtomicBool>) -> IndexResult<()> {
        let site = match self.store.find_site_by_url(&config.url).await? {
            Some(existing) => existing,
            None => self.store.create_site(&config.url, &config.name).await?,
        };

        match self.scheduler.crawl_site(&site, Arc::clone(&stop)).await {
            Ok(()) if stop.load(Ordering::Relaxed) => {
                self.store
                    .update_site_status(site.id, SiteStatus::Failed, Some(&IndexError::Cancelled.to_string()))
                    .await
            }
            Ok(()) => {
                self.store
                    .update_site_status(site.id, SiteStatus::Indexed, None)
                    .await
            }
            Err(e) => {
                self.store
                    .update_site_status(site.id, SiteStatus::Failed, Some(&e.to_string()))
                    .await
            }
        }
    }
}
