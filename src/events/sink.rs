use chrono::{DateTime, Utc};
use crossbeam_queue::SegQueue;

use crate::errors::ErrorKind;

/// One observed failure: when it happened, what kind it was, and whatever
/// context (usually a URL or site name) the caller had on hand.
#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: ErrorKind,
    pub message: String,
    pub context: Option<String>,
}

/// Lock-free append-only error log, owned by the [`IndexingCoordinator`](crate::coordinator::IndexingCoordinator).
///
/// One coordinator per process owns one sink; `record` is cheap enough to
/// call from any task without contending with the crawl itself.
#[derive(Default)]
pub struct ErrorsSink {
    entries: SegQueue<ErrorEntry>,
}

impl ErrorsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure with free-form context, e.g. `(url, "fetch")`.
    pub fn record(&self, kind: ErrorKind, message: impl Into<String>, context: Option<String>) {
        self.entries.push(ErrorEntry {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            context,
        });
    }

    /// Drain every entry recorded so far, leaving the sink empty.
    ///
    /// Called by the Coordinator at the start of each run and by the
    /// (out-of-scope) statistics reporter between runs.
    pub fn drain(&self) -> Vec<ErrorEntry> {
        let mut out = Vec::new();
        while let Some(entry) = self.entries.pop() {
            out.push(entry);
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
