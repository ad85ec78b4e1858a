//! LUT error types.
//!
//! Curve generation and XMP decoding never fail on content; only file
//! access surfaces as an error.

use thiserror::Error;

/// Result type for LUT and preset I/O.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur while reading or writing presets.
#[derive(Debug, Error)]
pub enum LutError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
