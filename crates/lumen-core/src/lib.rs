//! # lumen-core
//!
//! Core types shared by the lumen grading crates.
//!
//! # Modules
//!
//! - [`pixel`] - packed `0xAARRGGBB` helpers
//! - [`image`] - [`ArgbImage`], an owned row-major buffer
//! - [`error`] - [`Error`] and [`Result`]
//!
//! # Used By
//!
//! - `lumen-ops` - pixel pipeline, capture processing
//! - `lumen-cli` - PNG import/export

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod pixel;

pub use error::{Error, Result};
pub use image::ArgbImage;

/// Commonly used items.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::ArgbImage;
    pub use crate::pixel::{pack, unpack};
}
