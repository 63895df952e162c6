//! Row types for the four persisted tables (spec.md §3/§6): `site`, `page`,
//! `lemma`, `indexx`.
//!
//! These are plain data carriers; [`crate::store::PageStore`] is the only
//! thing that reads or writes them.

use chrono::{DateTime, Utc};

/// A site's crawl lifecycle state (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl SiteStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Site {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: i32,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Lemma {
    pub id: i64,
    pub site_id: i64,
    pub text: String,
    pub frequency: i64,
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}
