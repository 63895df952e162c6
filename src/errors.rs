//! Error kinds shared across the indexing pipeline.
//!
//! Every variant here corresponds to one of the error kinds named in the
//! component design: malformed input, I/O failure, persistence failure,
//! control-plane misuse, and the handful of coordinator-level conditions
//! that can end a run early.

use thiserror::Error;

/// Errors produced anywhere in the indexing pipeline.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("pool termination forced after exceeding {0}s drain timeout")]
    PoolTerminationForced(u64),

    #[error("Indexing is already running")]
    AlreadyRunning,

    #[error("Indexing is not running")]
    NotRunning,

    #[error("URL is outside configured sites")]
    OutOfScope,

    #[error("Indexing interrupted by user")]
    Cancelled,

    #[error("analyzer initialization failed: {0}")]
    AnalyzerInit(String),
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<url::ParseError> for IndexError {
    fn from(err: url::ParseError) -> Self {
        Self::MalformedUrl(err.to_string())
    }
}

/// Coarse classification used by the Errors Sink (see [`crate::events`]).
///
/// Mirrors the variant names above without carrying the error payload, so a
/// sink entry stays small and `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedUrl,
    Io,
    Parse,
    Db,
    PoolTerminationForced,
    AlreadyRunning,
    NotRunning,
    OutOfScope,
    Cancelled,
    AnalyzerInit,
}

impl From<&IndexError> for ErrorKind {
    fn from(err: &IndexError) -> Self {
        match err {
            IndexError::MalformedUrl(_) => Self::MalformedUrl,
            IndexError::Io(_) => Self::Io,
            IndexError::Parse(_) => Self::Parse,
            IndexError::Db(_) => Self::Db,
            IndexError::PoolTerminationForced(_) => Self::PoolTerminationForced,
            IndexError::AlreadyRunning => Self::AlreadyRunning,
            IndexError::NotRunning => Self::NotRunning,
            IndexError::OutOfScope => Self::OutOfScope,
            IndexError::Cancelled => Self::Cancelled,
            IndexError::AnalyzerInit(_) => Self::AnalyzerInit,
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
