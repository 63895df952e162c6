//! The Errors Sink: an append-only, process-wide log of failures observed
//! during a run.
//!
//! Page-level failures never abort a run — they're recorded here with
//! enough context for the (out-of-scope) statistics reporter to surface
//! later. Site-level and coordinator-level failures are recorded here too,
//! in addition to updating the affected `Site` row.

mod sink;

pub use sink::{ErrorEntry, ErrorsSink};
