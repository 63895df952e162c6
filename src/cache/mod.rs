//! Bounded, run-local caches (spec.md §3, §4.4): the `LemmaCache` (C4) that
//! coalesces DB lookups while a site is being crawled, and the `PageUrlCache`
//! that short-circuits re-processing of a URL already seen in this run.
//!
//! Both are plain `lru::LruCache` behind a `parking_lot::Mutex` — the same
//! shape the teacher crate uses for its own bounded caches (see
//! `link_index::LinkIndex`'s in-memory page/link maps), generalized with an
//! idle-TTL sweep on read since neither cache here is a simple memo.

mod lemma_cache;
mod page_url_cache;

pub use lemma_cache::{LemmaCache, LemmaHandle};
pub use page_url_cache::PageUrlCache;
