//! Error types for grading operations.

use thiserror::Error;

/// Error type for grading operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Pixel buffer length differs from `width * height`.
    #[error("size mismatch: expected {expected} pixels, got {actual}")]
    SizeMismatch {
        /// `width * height`
        expected: usize,
        /// Buffer length
        actual: usize,
    },

    /// Image buffer error.
    #[error(transparent)]
    Core(#[from] lumen_core::Error),
}

/// Result type for grading operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Checks that a packed buffer holds exactly `width * height` pixels.
pub(crate) fn check_buffer(len: usize, width: u32, height: u32) -> OpsResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| OpsError::InvalidDimensions(format!("{width}x{height} overflows")))?;
    if len != expected {
        return Err(OpsError::SizeMismatch { expected, actual: len });
    }
    Ok(())
}
