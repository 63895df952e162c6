//! Indexing Coordinator (C9): the single process-wide entry point for
//! `startIndexing`, `stopIndexing`, and `indexPage` (spec.md §4.9).
//!
//! `running` and `stop` are plain `AtomicBool`s owned by this struct rather
//! than global statics (spec.md §9's "Global mutable state" design note) —
//! exactly one `IndexingCoordinator` is expected per process, matching the
//! spec's stated constraint, but nothing here relies on that via a
//! process-wide singleton.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::IndexingConfig;
use crate::errors::{ErrorKind, IndexError, IndexResult};
use crate::events::ErrorsSink;
use crate::cache::{LemmaCache, PageUrlCache};
use crate::reindexer::SinglePageReindexer;
use crate::site_indexer::SiteIndexer;
use crate::store::PageStore;

pub struct IndexingCoordinator {
    store: Arc<PageStore>,
    site_indexer: Arc<SiteIndexer>,
    reindexer: Arc<SinglePageReindexer>,
    lemma_cache: Arc<LemmaCache>,
    page_url_cache: Arc<PageUrlCache>,
    errors: Arc<ErrorsSink>,
    config: IndexingConfig,
    running: AtomicBool,
    stop: Arc<AtomicBool>,
}

impl IndexingCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<PageStore>,
        site_indexer: Arc<SiteIndexer>,
        reindexer: Arc<SinglePageReindexer>,
        lemma_cache: Arc<LemmaCache>,
        page_url_cache: Arc<PageUrlCache>,
        errors: Arc<ErrorsSink>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            store,
            site_indexer,
            reindexer,
            lemma_cache,
            page_url_cache,
            errors,
            config,
            running: AtomicBool::new(false),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorsSink {
        &self.errors
    }

    /// Begin indexing every configured site. Truncates the whole database
    /// exactly once here (spec.md §4.8's policy-(b) fix), then fans each
    /// site out bounded by `parallelism` (spec.md §5). Returns immediately;
    /// the crawl itself runs in a detached task.
    pub async fn start_indexing(self: &Arc<Self>) -> IndexResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(IndexError::AlreadyRunning);
        }
        self.stop.store(false, Ordering::Relaxed);
        self.errors.drain();
        if let Err(e) = self.store.reset_all().await {
            self.running.store(false, Ordering::Release);
            return Err(e);
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_all_sites().await;
            this.lemma_cache.clear();
            this.page_url_cache.clear();
            this.running.store(false, Ordering::Release);
        });

        Ok(())
    }

    async fn run_all_sites(&self) {
        use tokio::sync::Semaphore;

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut handles = Vec::with_capacity(self.config.sites.len());

        for site_config in self.config.sites.clone() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let site_indexer = Arc::clone(&self.site_indexer);
            let stop = Arc::clone(&self.stop);
            let abort_handle_source = tokio::spawn(async move {
                let _permit = permit;
                site_indexer.index_site(&site_config, stop).await
            });
            handles.push(abort_handle_source);
        }

        let drain_timeout = Duration::from_secs(self.config.pool_drain_timeout_secs);
        for handle in handles {
            let abort_handle = handle.abort_handle();
            match tokio::time::timeout(drain_timeout, handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => self.errors.record(ErrorKind::from(&e), e.to_string(), None),
                Ok(Err(join_err)) => self.errors.record(
                    ErrorKind::Io,
                    format!("site task panicked: {join_err}"),
                    None,
                ),
                Err(_elapsed) => {
                    abort_handle.abort();
                    let err = IndexError::PoolTerminationForced(drain_timeout.as_secs());
                    self.errors.record(ErrorKind::from(&err), err.to_string(), None);
                }
            }
        }
    }

    /// Request cancellation of the in-flight run. Sites already dispatched
    /// observe `stop` at the next of the Crawl Scheduler's four checkpoints
    /// and wind down; this call itself does not block on that.
    pub fn stop_indexing(&self) -> IndexResult<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(IndexError::NotRunning);
        }
        self.stop.store(true, Ordering::Relaxed);
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Re-index a single URL outside the normal crawl (spec.md §4.9
    /// delegating straight to the Single-page Re-indexer).
    pub async fn index_page(&self, url: &str) -> IndexResult<bool> {
        self.reindexer.index_page(url).await
    }
}
