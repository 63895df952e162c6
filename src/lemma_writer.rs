//! Lemma/Index writer: `save_lemmas_and_indices` (spec.md §4.7), factored
//! into its own service per the dependency-inversion note in spec.md §9 so
//! both the Crawl Scheduler and the Single-page Re-indexer depend on it
//! rather than the re-indexer calling back into crawler code.
//!
//! Serializes per site with a `tokio::sync::Mutex` shard (spec.md §9:
//! "shard by site... correct given that each Lemma row is site-scoped"),
//! not the coarser global lock the source used.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::LemmaCache;
use crate::errors::IndexResult;
use crate::store::{IndexRecord, LemmaRecord, PageStore};

pub struct LemmaIndexWriter {
    store: Arc<PageStore>,
    lemma_cache: Arc<LemmaCache>,
    site_locks: DashMap<i64, Arc<AsyncMutex<()>>>,
    batch_size: usize,
}

impl LemmaIndexWriter {
    #[must_use]
    pub fn new(store: Arc<PageStore>, lemma_cache: Arc<LemmaCache>, batch_size: usize) -> Self {
        Self {
            store,
            lemma_cache,
            site_locks: DashMap::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// The underlying store, so callers that already hold a writer (the
    /// Crawl Scheduler, the Single-page Re-indexer) don't need a second
    /// `Arc<PageStore>` threaded through separately.
    #[must_use]
    pub fn store(&self) -> &PageStore {
        &self.store
    }

    fn site_lock(&self, site_id: i64) -> Arc<AsyncMutex<()>> {
        self.site_locks
            .entry(site_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// For each `(lemma_text, count)` observed on `page_id`: get-or-create
    /// the cached handle, add `count` to its frequency, and record a
    /// `(page, lemma, rank=count)` index row. The whole pass runs under
    /// `site_id`'s lock, then flushes in `batch_size`-sized chunks so a
    /// page with an unusually large lemma vocabulary doesn't hold one
    /// giant transaction.
    pub async fn save_lemmas_and_indices(
        &self,
        site_id: i64,
        page_id: i64,
        counts: HashMap<String, u32>,
    ) -> IndexResult<()> {
        let lock = self.site_lock(site_id);
        let _guard = lock.lock().await;

        let mut touched = Vec::with_capacity(counts.len());
        for (text, count) in &counts {
            let handle = self
                .lemma_cache
                .get_or_create(&self.store, site_id, text)
                .await?;
            {
                let mut handle = handle.lock();
                handle.frequency += i64::from(*count);
            }
            touched.push((handle, *count));
        }

        for chunk in touched.chunks(self.batch_size) {
            let records: Vec<LemmaRecord> = chunk
                .iter()
                .map(|(handle, _)| {
                    let handle = handle.lock();
                    LemmaRecord {
                        db_id: handle.db_id,
                        site_id: handle.site_id,
                        text: handle.text.clone(),
                        frequency: handle.frequency,
                    }
                })
                .collect();

            let ids = self.store.save_lemmas_batch(&records).await?;

            for ((handle, _), id) in chunk.iter().zip(ids.iter()) {
                handle.lock().db_id = Some(*id);
            }

            let index_records: Vec<IndexRecord> = chunk
                .iter()
                .zip(ids.iter())
                .map(|((_, count), id)| IndexRecord {
                    page_id,
                    lemma_id: *id,
                    rank: f64::from(*count),
                })
                .collect();

            self.store.save_indices_batch(&index_records).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn aggregates_frequency_across_two_pages() {
        let store = Arc::new(PageStore::connect(":memory:").await.expect("store"));
        let cache = Arc::new(LemmaCache::new(100));
        let writer = LemmaIndexWriter::new(store.clone(), cache, 5000);

        let site = store.create_site("http://example.test/", "Example").await.expect("site");
        let page_a = store.save_page(site.id, "/a", 200, "cat cat cat").await.expect("page a");
        let page_b = store.save_page(site.id, "/b", 200, "cat cat cat cat cat").await.expect("page b");

        writer
            .save_lemmas_and_indices(site.id, page_a.id, HashMap::from([("cat".to_string(), 3)]))
            .await
            .expect("save a");
        writer
            .save_lemmas_and_indices(site.id, page_b.id, HashMap::from([("cat".to_string(), 5)]))
            .await
            .expect("save b");

        let lemma = store.find_lemma(site.id, "cat").await.expect("find").expect("present");
        assert_eq!(lemma.frequency, 8);
    }

    #[tokio::test]
    async fn flushes_in_batches() {
        let store = Arc::new(PageStore::connect(":memory:").await.expect("store"));
        let cache = Arc::new(LemmaCache::new(100));
        let writer = LemmaIndexWriter::new(store.clone(), cache, 1);

        let site = store.create_site("http://example.test/", "Example").await.expect("site");
        let page = store.save_page(site.id, "/", 200, "cat dog").await.expect("page");

        let counts = HashMap::from([("cat".to_string(), 1), ("dog".to_string(), 2)]);
        writer
            .save_lemmas_and_indices(site.id, page.id, counts)
            .await
            .expect("save");

        assert_eq!(store.find_lemma(site.id, "cat").await.expect("find").expect("p").frequency, 1);
        assert_eq!(store.find_lemma(site.id, "dog").await.expect("find").expect("p").frequency, 2);
    }
}
