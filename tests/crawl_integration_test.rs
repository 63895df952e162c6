//! End-to-end crawl scenarios exercised against the public crate API: a
//! stub `Fetcher` standing in for the network, an in-memory SQLite store,
//! and a real `CrawlScheduler` / `SiteIndexer` driving the whole pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use site_indexer::cache::{LemmaCache, PageUrlCache};
use site_indexer::config::SiteConfig;
use site_indexer::errors::IndexResult;
use site_indexer::events::ErrorsSink;
use site_indexer::fetch::{FetchResult, Fetcher};
use site_indexer::lemma::LemmaAnalyzer;
use site_indexer::lemma_writer::LemmaIndexWriter;
use site_indexer::model::SiteStatus;
use site_indexer::scheduler::CrawlScheduler;
use site_indexer::site_indexer::SiteIndexer;
use site_indexer::store::PageStore;

/// Fetcher backed by a fixed `url -> html` routing table, plus a page-view
/// counter so tests can assert a URL is only ever fetched once (P4).
struct StubSite {
    pages: HashMap<&'static str, &'static str>,
    fetch_counts: std::sync::Mutex<HashMap<String, u32>>,
}

#[async_trait]
impl Fetcher for StubSite {
    async fn fetch(&self, url: &str) -> IndexResult<FetchResult> {
        *self.fetch_counts.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let body = self
            .pages
            .get(url)
            .copied()
            .unwrap_or("<html><body>not found</body></html>");
        Ok(FetchResult {
            status_code: 200,
            final_url: url.to_string(),
            document: body.to_string(),
        })
    }
}

async fn run_site(
    fetcher: Arc<StubSite>,
    seed: &str,
) -> (Arc<PageStore>, site_indexer::model::Site) {
    let store = Arc::new(PageStore::connect(":memory:").await.expect("store"));
    let analyzer = Arc::new(LemmaAnalyzer::new().expect("analyzer"));
    let page_url_cache = Arc::new(PageUrlCache::new(600, Duration::from_secs(600)));
    let lemma_cache = Arc::new(LemmaCache::new(10_000));
    let errors = Arc::new(ErrorsSink::new());
    let writer = Arc::new(LemmaIndexWriter::new(store.clone(), lemma_cache, 5000));

    let scheduler = CrawlScheduler::new(
        fetcher,
        analyzer,
        page_url_cache,
        writer,
        errors.clone(),
        4,
        HashSet::new(),
    );
    let site_indexer = SiteIndexer::new(store.clone(), scheduler);

    let config = SiteConfig {
        url: seed.to_string(),
        name: "Example".to_string(),
    };
    site_indexer
        .index_site(&config, Arc::new(AtomicBool::new(false)))
        .await
        .expect("index_site");

    assert!(errors.is_empty(), "unexpected errors recorded: {:?}", errors.drain());

    let site = store
        .find_site_by_url(seed)
        .await
        .expect("find_site_by_url")
        .expect("site row present");
    (store, site)
}

/// Scenario 1 (spec.md §8): a seed linking to `/a` and `/a/` yields exactly
/// one Page per canonical path, no duplicates.
#[tokio::test]
async fn single_seed_two_pages_canonicalize_to_one_page_each() {
    let fetcher = Arc::new(StubSite {
        pages: HashMap::from([
            (
                "http://example.test/",
                r#"<html><body><a href="/a">a</a><a href="/a/">a again</a></body></html>"#,
            ),
            ("http://example.test/a", "<html><body>cat</body></html>"),
        ]),
        fetch_counts: std::sync::Mutex::new(HashMap::new()),
    });

    let (store, site) = run_site(fetcher.clone(), "http://example.test/").await;

    assert_eq!(site.status, SiteStatus::Indexed);

    let root = store.find_page(site.id, "/").await.expect("find").expect("root page");
    assert_eq!(root.path, "/");

    let a = store.find_page(site.id, "/a").await.expect("find").expect("/a page");
    assert_eq!(a.path, "/a");

    // /a was only ever fetched once even though both /a and /a/ (normalizing
    // to the same canonical URL) point at it.
    let counts = fetcher.fetch_counts.lock().unwrap();
    assert_eq!(counts.get("http://example.test/a").copied(), Some(1));
}

/// Scenario 2: a cross-site link is never fetched.
#[tokio::test]
async fn cross_site_links_are_not_fetched() {
    let fetcher = Arc::new(StubSite {
        pages: HashMap::from([
            (
                "http://example.test/",
                r#"<html><body><a href="http://other.test/x">other</a></body></html>"#,
            ),
            ("http://other.test/x", "<html><body>off-site</body></html>"),
        ]),
        fetch_counts: std::sync::Mutex::new(HashMap::new()),
    });

    let (store, site) = run_site(fetcher.clone(), "http://example.test/").await;

    assert_eq!(site.status, SiteStatus::Indexed);
    let other_site = store.find_site_by_url("http://other.test/x").await.expect("find");
    assert!(other_site.is_none());
    assert!(!fetcher.fetch_counts.lock().unwrap().contains_key("http://other.test/x"));
}

/// Scenario 3: a binary extension link is skipped without a fetch.
#[tokio::test]
async fn binary_links_are_skipped_without_fetching() {
    let fetcher = Arc::new(StubSite {
        pages: HashMap::from([(
            "http://example.test/",
            r#"<html><body><a href="/doc.pdf">doc</a></body></html>"#,
        )]),
        fetch_counts: std::sync::Mutex::new(HashMap::new()),
    });

    let (store, site) = run_site(fetcher.clone(), "http://example.test/").await;

    assert_eq!(site.status, SiteStatus::Indexed);
    assert!(store.find_page(site.id, "/doc.pdf").await.expect("find").is_none());
    assert!(!fetcher.fetch_counts.lock().unwrap().contains_key("http://example.test/doc.pdf"));
}

/// Scenario 5: two pages contribute 3 and 5 occurrences of "cat" — one
/// Lemma row with frequency 8, two distinct per-page ranks.
#[tokio::test]
async fn lemma_frequency_aggregates_across_pages() {
    let fetcher = Arc::new(StubSite {
        pages: HashMap::from([
            (
                "http://example.test/",
                r#"<html><body>cat cat cat<a href="/b">b</a></body></html>"#,
            ),
            ("http://example.test/b", "<html><body>cat cat cat cat cat</body></html>"),
        ]),
        fetch_counts: std::sync::Mutex::new(HashMap::new()),
    });

    let (store, site) = run_site(fetcher, "http://example.test/").await;

    let lemma = store.find_lemma(site.id, "cat").await.expect("find").expect("present");
    assert_eq!(lemma.frequency, 8);
}

/// A seed that links to `link_count` children, each taking `delay` to
/// fetch — slow enough for a test to flip a shared `stop` flag partway
/// through the crawl and observe it take effect.
struct SlowLinkFarm {
    delay: Duration,
    link_count: usize,
}

#[async_trait]
impl Fetcher for SlowLinkFarm {
    async fn fetch(&self, url: &str) -> IndexResult<FetchResult> {
        tokio::time::sleep(self.delay).await;
        if url == "http://example.test/" {
            let links: String = (0..self.link_count)
                .map(|i| format!(r#"<a href="/page{i}">p{i}</a>"#))
                .collect();
            Ok(FetchResult {
                status_code: 200,
                final_url: url.to_string(),
                document: format!("<html><body>{links}</body></html>"),
            })
        } else {
            Ok(FetchResult {
                status_code: 200,
                final_url: url.to_string(),
                document: "<html><body>cat</body></html>".to_string(),
            })
        }
    }
}

/// Scenario 4 / P5 (spec.md §8): cancelling mid-run leaves the site
/// `FAILED` with the exact interrupted-by-user message, and the frontier
/// stops short of processing every discovered child.
#[tokio::test]
async fn cancellation_mid_crawl_marks_site_failed_with_interrupted_message() {
    let store = Arc::new(PageStore::connect(":memory:").await.expect("store"));
    let analyzer = Arc::new(LemmaAnalyzer::new().expect("analyzer"));
    let page_url_cache = Arc::new(PageUrlCache::new(1000, Duration::from_secs(600)));
    let lemma_cache = Arc::new(LemmaCache::new(1000));
    let errors = Arc::new(ErrorsSink::new());
    let writer = Arc::new(LemmaIndexWriter::new(store.clone(), lemma_cache, 5000));
    let fetcher: Arc<dyn Fetcher> = Arc::new(SlowLinkFarm {
        delay: Duration::from_millis(40),
        link_count: 100,
    });

    let scheduler = CrawlScheduler::new(
        fetcher,
        analyzer,
        page_url_cache,
        writer,
        errors.clone(),
        4,
        HashSet::new(),
    );
    let site_indexer = SiteIndexer::new(store.clone(), scheduler);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_setter = Arc::clone(&stop);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        stop_setter.store(true, std::sync::atomic::Ordering::Relaxed);
    });

    let config = SiteConfig {
        url: "http://example.test/".to_string(),
        name: "Example".to_string(),
    };
    site_indexer
        .index_site(&config, stop)
        .await
        .expect("index_site");

    let site = store
        .find_site_by_url("http://example.test/")
        .await
        .expect("find")
        .expect("site row present");
    assert_eq!(site.status, SiteStatus::Failed);
    assert_eq!(site.last_error.as_deref(), Some("Indexing interrupted by user"));

    let mut saved = 0;
    for i in 0..100 {
        if store
            .find_page(site.id, &format!("/page{i}"))
            .await
            .expect("find")
            .is_some()
        {
            saved += 1;
        }
    }
    assert!(
        saved < 100,
        "cancellation should have left some of the 100 discovered children unprocessed, but all {saved} were saved"
    );
}
