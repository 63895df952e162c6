//! Multi-site web crawler and inverted-index builder.
//!
//! A configured set of seed sites is crawled concurrently and bounded
//! (`scheduler`), each page's text lemmatized (`lemma`) and persisted
//! alongside a per-site inverted index (`store`), with a small HTTP surface
//! (`http`) to start/stop a run or re-index a single page on demand
//! (`reindexer`). See `DESIGN.md` for how each module maps onto the teacher
//! crate this was built from.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod fetch;
pub mod http;
pub mod lemma;
pub mod lemma_writer;
pub mod links;
pub mod model;
pub mod normalize;
pub mod reindexer;
pub mod scheduler;
pub mod site_indexer;
pub mod store;
pub mod visited;

pub use config::IndexingConfig;
pub use coordinator::IndexingCoordinator;
pub use errors::{IndexError, IndexResult};
pub use model::{IndexEntry, Lemma, Page, Site, SiteStatus};
