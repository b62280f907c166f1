//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while building or validating the fundamental types.
#[derive(Debug, Error, PartialEq)]
pub enum TypesError {
    #[error("invalid parameter: {0}")]
    InvalidParams(String),

    #[error("invalid base64 frame: {0}")]
    InvalidBase64(String),

    #[error("raster buffer size mismatch: {width}x{height} needs {expected} bytes, got {actual}")]
    RasterSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("direction {0} appears twice in the challenge sequence")]
    DuplicateDirection(String),

    #[error("challenge sequence is empty")]
    EmptySequence,
}
