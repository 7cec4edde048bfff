//! Error types for staff line retrieval.

use thiserror::Error;

use scorescan_core::CoreError;

/// Errors preventing the staff line retrieval from starting.
///
/// Once started, the retrieval never fails: unusable data is discarded.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: usize, height: usize },

    #[error("cannot estimate sheet scale: {0}")]
    NoScale(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
