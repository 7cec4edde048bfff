//! Errors raised while building core values from external data.

use thiserror::Error;

/// Errors for invalid image or scale inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("image buffer holds {len} pixels, expected {width}x{height}")]
    ImageSize {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("invalid scale: {0}")]
    InvalidScale(String),
}
