// Typed errors for the invariant guards that callers are expected to match on.
//
// Collaborator traits (scorers, corpora, weightings) return anyhow::Result so
// implementations can attach whatever context they like. The guards below are
// different: misusing a histogram or building a pool with zero workers is a
// programming error the caller should be able to recognize.

use thiserror::Error;

/// Result alias for the typed library errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the core data structures and the worker pool.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Histogram(#[from] HistogramError),

    #[error("Invalid delimiter pattern: {0}")]
    Regex(#[from] regex_lite::Error),
}

/// State and argument violations on a `TemporalHistogram`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistogramError {
    #[error("Cannot {op}: histogram is already normalized")]
    AlreadyNormalized { op: &'static str },

    #[error("Histogram must be normalized first")]
    NotNormalized,

    #[error("Histogram sizes differ: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("Bin index {index} out of range for histogram of {len} bins")]
    BinOutOfRange { index: usize, len: usize },
}
