//! Configuration for the indexing pipeline (C11).
//!
//! Loading configuration from disk is explicitly out of scope for
//! correctness — a missing or malformed file falls back to defaults with a
//! logged warning rather than failing the process.

mod builder;
mod loader;
mod types;

pub use builder::IndexingConfigBuilder;
pub use types::{IndexingConfig, SiteConfig};
