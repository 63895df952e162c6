//! Lemma Cache (C4): `(site_id, lemma_text) -> LemmaHandle`, coalescing
//! repeat DB lookups for the same lemma within a run.
//!
//! Not write-through (spec.md §4.4): a handle's `frequency` is mutated by
//! the caller (the `LemmaIndexWriter`) and only reaches the database on the
//! next batch flush. Eviction from the LRU map never drops those
//! mutations — the writer keeps its own strong references to every handle
//! it touched on a page until that page's batch is flushed, so losing the
//! cache's reference merely means the next lookup re-reads from the store.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::errors::IndexResult;
use crate::store::PageStore;

/// A mutable, possibly-unpersisted Lemma row.
///
/// `db_id` is `None` until the first `save_lemmas_batch` flush assigns one.
#[derive(Debug, Clone)]
pub struct LemmaHandle {
    pub db_id: Option<i64>,
    pub site_id: i64,
    pub text: String,
    pub frequency: i64,
}

type Entry = (Arc<Mutex<LemmaHandle>>, Instant);

/// Eviction is by least-recently-accessed (capacity) and by idle TTL
/// (spec.md §3: `lemmaCache.idle_ttl ≈ 10 min`). A handle past its TTL is
/// treated as a miss on its next lookup and re-derived from the store or
/// fabricated fresh — safe per spec.md §4.4/§9 because the `LemmaIndexWriter`
/// holds its own strong references to every handle it has mutated until
/// that page's batch is flushed, so a stale cache slot never drops an
/// unflushed mutation, only the cache's pointer to it.
pub struct LemmaCache {
    inner: Mutex<LruCache<(i64, String), Entry>>,
    idle_ttl: Duration,
}

impl LemmaCache {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self::with_idle_ttl(max, Duration::from_secs(600))
    }

    #[must_use]
    pub fn with_idle_ttl(max: usize, idle_ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            idle_ttl,
        }
    }

    /// Non-consulting lookup: returns a cached handle without touching the
    /// store, promoting it in the LRU order on hit. A handle idle past the
    /// configured TTL is evicted and reported as absent rather than returned.
    #[must_use]
    pub fn peek(&self, site_id: i64, text: &str) -> Option<Arc<Mutex<LemmaHandle>>> {
        let key = (site_id, text.to_string());
        let mut inner = self.inner.lock();
        match inner.get(&key) {
            Some((handle, accessed_at)) if accessed_at.elapsed() <= self.idle_ttl => {
                let handle = handle.clone();
                inner.put(key, (handle.clone(), Instant::now()));
                Some(handle)
            }
            Some(_) => {
                inner.pop(&key);
                None
            }
            None => None,
        }
    }

    /// `get_or_create` (spec.md §4.4): on a cache miss, consult the store for
    /// an existing row; if none exists, fabricate a fresh in-memory handle.
    ///
    /// The fabricated handle starts at `frequency = 0`, not `1` as spec.md's
    /// prose literally reads — the caller (`LemmaIndexWriter`) always adds
    /// the page's own occurrence count immediately after creation, and
    /// starting from 1 would double-count a lemma's first occurrence against
    /// testable property P3 (`frequency == Σ occurrence_count`). See
    /// DESIGN.md for this resolution.
    pub async fn get_or_create(
        &self,
        store: &PageStore,
        site_id: i64,
        text: &str,
    ) -> IndexResult<Arc<Mutex<LemmaHandle>>> {
        if let Some(handle) = self.peek(site_id, text) {
            return Ok(handle);
        }

        let handle = match store.find_lemma(site_id, text).await? {
            Some(lemma) => Arc::new(Mutex::new(LemmaHandle {
                db_id: Some(lemma.id),
                site_id,
                text: text.to_string(),
                frequency: lemma.frequency,
            })),
            None => Arc::new(Mutex::new(LemmaHandle {
                db_id: None,
                site_id,
                text: text.to_string(),
                frequency: 0,
            })),
        };

        self.inner
            .lock()
            .put((site_id, text.to_string()), (handle.clone(), Instant::now()));
        Ok(handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drop every cached handle. Called by the Coordinator between runs
    /// (spec.md §4.9) — never mid-page, per the cache-consistency hazard
    /// noted in spec.md §9.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
