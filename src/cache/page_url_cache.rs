//! `PageUrlCache`: a soft, TTL-bounded cache layered on top of the hard
//! `VisitedSet` (spec.md §4.7 "Process page" step 1). Its purpose is purely
//! to let a URL fall back out of cache after its idle TTL so a subsequent
//! single-page re-index isn't silently short-circuited by the crawl's own
//! dedup layer.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

pub struct PageUrlCache {
    inner: Mutex<LruCache<String, Instant>>,
    idle_ttl: Duration,
}

impl PageUrlCache {
    #[must_use]
    pub fn new(max: usize, idle_ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            idle_ttl,
        }
    }

    /// True if `url` was marked within the idle TTL. A stale entry is
    /// evicted on the way out rather than treated as present.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.get(url) {
            Some(marked_at) if marked_at.elapsed() <= self.idle_ttl => true,
            Some(_) => {
                inner.pop(url);
                false
            }
            None => false,
        }
    }

    pub fn insert(&self, url: String) {
        self.inner.lock().put(url, Instant::now());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
