//! Visited Set (C5): the single atomic primitive that decides whether a URL
//! becomes a crawl task (spec.md §4.5, invariant 5).
//!
//! Backed by `dashmap::DashSet`, the same lock-free concurrent set the
//! teacher crate's orchestrator uses for its own per-crawl visited tracking
//! (`crawl_engine::orchestrator::crawl_pages`'s `visited: Arc<DashSet<String>>`).

use dashmap::DashSet;

#[derive(Default)]
pub struct VisitedSet {
    inner: DashSet<String>,
}

impl VisitedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically insert `url` and report whether it was newly claimed.
    /// All enqueue decisions in the Crawl Scheduler route through this.
    pub fn claim(&self, url: &str) -> bool {
        self.inner.insert(url.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
