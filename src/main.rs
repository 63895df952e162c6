//! Binary entrypoint: load configuration, wire the indexing pipeline
//! together, and serve the HTTP Control Surface (spec.md §4.14, §6).

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use site_indexer::cache::{LemmaCache, PageUrlCache};
use site_indexer::config::IndexingConfig;
use site_indexer::coordinator::IndexingCoordinator;
use site_indexer::errors::IndexResult;
use site_indexer::events::ErrorsSink;
use site_indexer::fetch::{Fetcher, ReqwestFetcher};
use site_indexer::http::router;
use site_indexer::lemma::LemmaAnalyzer;
use site_indexer::lemma_writer::LemmaIndexWriter;
use site_indexer::reindexer::SinglePageReindexer;
use site_indexer::scheduler::CrawlScheduler;
use site_indexer::site_indexer::SiteIndexer;
use site_indexer::store::PageStore;

#[tokio::main]
async fn main() -> IndexResult<()> {
    env_logger::init();

    let config_path = std::env::var("SITE_INDEXER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = IndexingConfig::load(Path::new(&config_path));
    log::info!("loaded configuration: {} site(s), parallelism={}", config.sites.len(), config.parallelism);

    let store = Arc::new(PageStore::connect(&config.database_path).await?);

    let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(
        Duration::from_secs(config.connect_timeout_secs),
        Duration::from_secs(config.read_timeout_secs),
    )?);
    let analyzer = Arc::new(LemmaAnalyzer::new()?);
    let lemma_cache = Arc::new(LemmaCache::with_idle_ttl(
        config.lemma_cache_max,
        config.lemma_cache_idle_ttl,
    ));
    let page_url_cache = Arc::new(PageUrlCache::new(config.page_url_cache_max, config.page_url_cache_idle_ttl));
    let errors = Arc::new(ErrorsSink::new());
    let writer = Arc::new(LemmaIndexWriter::new(store.clone(), lemma_cache.clone(), config.batch_size));

    let binary_extensions: HashSet<String> = config.binary_extensions.clone();

    let scheduler = CrawlScheduler::new(
        fetcher.clone(),
        analyzer.clone(),
        page_url_cache.clone(),
        writer.clone(),
        errors.clone(),
        config.parallelism,
        binary_extensions.clone(),
    );
    let site_indexer = Arc::new(SiteIndexer::new(store.clone(), scheduler));
    let reindexer = Arc::new(SinglePageReindexer::new(fetcher, analyzer, writer, binary_extensions));

    let coordinator = Arc::new(IndexingCoordinator::new(
        store,
        site_indexer,
        reindexer,
        lemma_cache,
        page_url_cache,
        errors,
        config,
    ));

    let addr: SocketAddr = std::env::var("SITE_INDEXER_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()
        .expect("SITE_INDEXER_ADDR must be a valid socket address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| site_indexer::errors::IndexError::Io(e.to_string()))?;
    log::info!("listening on {addr}");

    axum::serve(listener, router(coordinator))
        .await
        .map_err(|e| site_indexer::errors::IndexError::Io(e.to_string()))?;

    Ok(())
}
