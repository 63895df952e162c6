//! Crawl Scheduler (C7): fetches a site starting at its seed URL and fans
//! out across discovered internal links until the frontier is empty or the
//! run is cancelled (spec.md §4.7).
//!
//! The fan-out shape is lifted directly from the teacher crate's own
//! crawl loop (`crawl_engine::orchestrator::crawl_pages`): a `VecDeque`
//! frontier behind a `tokio::sync::Mutex`, a `Semaphore` bounding how many
//! page tasks run at once, and `FuturesUnordered` draining whichever task
//! finishes first rather than waiting on them in submission order. Unlike
//! the teacher, there is no retry/backoff/circuit-breaker layer — spec.md
//! §4.7 treats a page-level fetch failure as terminal for that one page,
//! recorded in the Errors Sink and never retried.
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use url::Url;

use crate::cache::PageUrlCache;
use crate::errors::{ErrorKind, IndexError, IndexResult};
use crate::events::ErrorsSink;
use crate::fetch::{is_binary_url, is_supported_scheme, Fetcher};
use crate::lemma::analyzer::LemmaAnalyzer;
use crate::lemma_writer::LemmaIndexWriter;
use crate::model::Site;
use crate::normalize::{is_internal, normalize, path_of};
use crate::visited::VisitedSet;

struct Inner {
    fetcher: Arc<dyn Fetcher>,
    analyzer: Arc<LemmaAnalyzer>,
    page_url_cache: Arc<PageUrlCache>,
    writer: Arc<LemmaIndexWriter>,
    errors: Arc<ErrorsSink>,
    parallelism: usize,
    binary_extensions: HashSet<String>,
}

/// Owns nothing but `Arc`s, so cloning it to hand a copy to each spawned
/// page task is a handful of atomic increments, never a deep copy.
#[derive(Clone)]
pub struct CrawlScheduler(Arc<Inner>);

impl CrawlScheduler {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        analyzer: Arc<LemmaAnalyzer>,
        page_url_cache: Arc<PageUrlCache>,
        writer: Arc<LemmaIndexWriter>,
        errors: Arc<ErrorsSink>,
        parallelism: usize,
        binary_extensions: HashSet<String>,
    ) -> Self {
        Self(Arc::new(Inner {
            fetcher,
            analyzer,
            page_url_cache,
            writer,
            errors,
            parallelism: parallelism.max(1),
            binary_extensions,
        }))
    }

    /// Crawl `site` to completion. Only the seed fetch can fail this call
    /// outright (spec.md §4.7 step 1: "fetch the seed URL; on failure, the
    /// site fails"); every page reached after that records its own failure
    /// in the Errors Sink and is simply dropped from the frontier.
    pub async fn crawl_site(&self, site: &Site, stop: Arc<AtomicBool>) -> IndexResult<()> {
        let seed_host = Url::parse(&site.url)?
            .host_str()
            .ok_or_else(|| IndexError::MalformedUrl(site.url.clone()))?
            .to_string();

        let seed_fetched = self.0.fetcher.fetch(&site.url).await?;

        let visited = Arc::new(VisitedSet::new());
        let seed_normalized = normalize(&site.url);
        visited.claim(&seed_normalized.url);

        let mut frontier: VecDeque<String> = VecDeque::new();
        frontier.extend(
            self.process_page_safe(
                &seed_fetched,
                &seed_normalized.url,
                site,
                &seed_host,
                &visited,
                &stop,
            )
            .await,
        );

        let frontier = Arc::new(AsyncMutex::new(frontier));
        let semaphore = Arc::new(Semaphore::new(self.0.parallelism));
        let mut active = FuturesUnordered::new();

        loop {
            while active.len() < self.0.parallelism && !stop.load(Ordering::Relaxed) {
                let next = frontier.lock().await.pop_front();
                let Some(url) = next else { break };

                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let this = self.clone();
                let site = site.clone();
                let seed_host = seed_host.clone();
                let visited = Arc::clone(&visited);
                let stop = Arc::clone(&stop);

                active.push(tokio::spawn(async move {
                    let _permit = permit;
                    this.fetch_and_process(url, &site, &seed_host, &visited, &stop)
                        .await
                }));
            }

            if active.is_empty() {
                if frontier.lock().await.is_empty() || stop.load(Ordering::Relaxed) {
                    break;
                }
                continue;
            }

            match active.next().await {
                Some(Ok(children)) => frontier.lock().await.extend(children),
                Some(Err(join_err)) => self.0.errors.record(
                    ErrorKind::Io,
                    format!("page task panicked: {join_err}"),
                    None,
                ),
                None => break,
            }
        }

        Ok(())
    }

    /// Fetch one frontier URL and process it, recording any failure to the
    /// Errors Sink instead of propagating it — a single bad page never
    /// fails the whole site (spec.md §4.7, §7).
    async fn fetch_and_process(
        &self,
        url: String,
        site: &Site,
        seed_host: &str,
        visited: &VisitedSet,
        stop: &AtomicBool,
    ) -> Vec<String> {
        if stop.load(Ordering::Relaxed) {
            return Vec::new();
        }

        match self.0.fetcher.fetch(&url).await {
            Ok(fetched) => {
                self.process_page_safe(&fetched, &url, site, seed_host, visited, stop)
                    .await
            }
            Err(e) => {
                self.0
                    .errors
                    .record(ErrorKind::from(&e), e.to_string(), Some(url));
                Vec::new()
            }
        }
    }

    async fn process_page_safe(
        &self,
        fetched: &crate::fetch::FetchResult,
        requested_url: &str,
        site: &Site,
        seed_host: &str,
        visited: &VisitedSet,
        stop: &AtomicBool,
    ) -> Vec<String> {
        match self
            .process_page(fetched, requested_url, site, seed_host, visited, stop)
            .await
        {
            Ok(children) => children,
            Err(e) => {
                self.0.errors.record(
                    ErrorKind::from(&e),
                    e.to_string(),
                    Some(requested_url.to_string()),
                );
                Vec::new()
            }
        }
    }

    /// "Process page" (spec.md §4.7): persist the page and its lemmas, then
    /// return the internal links it discovered as the next frontier batch.
    /// Checks `stop` at every point the algorithm names, so a cancellation
    /// observed mid-page still leaves the database consistent.
    async fn process_page(
        &self,
        fetched: &crate::fetch::FetchResult,
        requested_url: &str,
        site: &Site,
        seed_host: &str,
        visited: &VisitedSet,
        stop: &AtomicBool,
    ) -> IndexResult<Vec<String>> {
        if stop.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }

        let normalized = normalize(requested_url);
        if !normalized.is_fetchable() {
            return Ok(Vec::new());
        }

        if self.0.page_url_cache.contains(&normalized.url) {
            return Ok(Vec::new());
        }
        self.0.page_url_cache.insert(normalized.url.clone());

        if is_binary_url(&normalized.url, &self.0.binary_extensions) {
            return Ok(Vec::new());
        }

        if stop.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }

        let path = path_of(&normalized.url)?;
        let page = self
            .0
            .writer
            .store()
            .save_page(
                site.id,
                &path,
                i32::from(fetched.status_code),
                &fetched.document,
            )
            .await?;

        if stop.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }

        let counts = self.0.analyzer.analyze_html(&fetched.document);
        self.0
            .writer
            .save_lemmas_and_indices(site.id, page.id, counts)
            .await?;

        if stop.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }

        let base = Url::parse(&fetched.final_url).unwrap_or_else(|_| {
            Url::parse(&normalized.url).expect("already-normalized URL reparses")
        });
        let discovered = crate::links::extract_links(&fetched.document, &base);

        let mut children = Vec::new();
        for href in discovered {
            let candidate = normalize(&href);
            if !candidate.is_fetchable() {
                continue;
            }
            let Ok(parsed) = Url::parse(&candidate.url) else {
                continue;
            };
            if !is_supported_scheme(parsed.scheme()) {
                continue;
            }
            if is_binary_url(&candidate.url, &self.0.binary_extensions) {
                continue;
            }
            let Some(host) = parsed.host_str() else {
                continue;
            };
            if !is_internal(host, seed_host) {
                continue;
            }
            if visited.claim(&candidate.url) {
                children.push(candidate.url);
            }
        }

        Ok(children)
    }
}
