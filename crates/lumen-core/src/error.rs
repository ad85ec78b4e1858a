//! Error types for lumen-core operations.
//!
//! # Usage
//!
//! ```rust
//! use lumen_core::{ArgbImage, Error};
//!
//! let err = ArgbImage::from_pixels(4, 4, vec![0; 3]).unwrap_err();
//! assert!(matches!(err, Error::SizeMismatch { expected: 16, actual: 3 }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or slicing image buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// Width or height is zero, or the pixel count overflows `usize`.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Buffer length does not match `width * height` (times channel count
    /// for byte buffers).
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// Region of interest extends beyond image bounds.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Byte buffer has a channel count other than 3 or 4.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),
}

impl Error {
    /// Checks `len == width * height` and returns [`Error::SizeMismatch`] otherwise.
    pub fn check_len(width: u32, height: u32, len: usize) -> Result<()> {
        let expected = width as usize * height as usize;
        if expected != len {
            return Err(Error::SizeMismatch { expected, actual: len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_len_accepts_exact() {
        assert!(Error::check_len(3, 2, 6).is_ok());
    }

    #[test]
    fn check_len_reports_counts() {
        let err = Error::check_len(3, 2, 5).unwrap_err();
        assert_eq!(err.to_string(), "buffer size mismatch: expected 6, got 5");
    }
}
