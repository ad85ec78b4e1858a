//! # lumen-ops
//!
//! Grading operations on packed `0xAARRGGBB` buffers.
//!
//! A grade is a color matrix (filter look plus saturation) followed by
//! up to four tone-curve LUTs. [`GradeSnapshot`] computes both once;
//! the pipeline then runs a branch-free loop over the pixels.
//!
//! # Modules
//!
//! - [`matrix`] - 4x5 [`ColorMatrix`] math
//! - [`filter`] - [`FilterPreset`] looks and the combined grade matrix
//! - [`snapshot`] - [`CurveLuts`], [`GradeSnapshot`], [`SnapshotCell`]
//! - [`pipeline`] - in-place grading
//! - [`parallel`] - row-band parallel grading (feature `parallel`)
//! - [`exchange`] - [`FrameExchange`] for preview frames
//! - [`watermark`] - footer/overlay configuration and layout
//! - [`capture`] - crop, grade and watermark a captured photo
//!
//! # Example
//!
//! ```rust
//! use lumen_lut::{Channel, CurveModel};
//! use lumen_ops::{FilterPreset, GradeSnapshot, pipeline};
//!
//! let mut model = CurveModel::new();
//! model.spline_mut(Channel::Rgb).insert(0.5, 0.4);
//! model.set_saturation(20);
//!
//! let snap = GradeSnapshot::new(&model, FilterPreset::Warm);
//! let mut frame = vec![0xFF40_6080u32; 32 * 18];
//! pipeline::apply_snapshot(&mut frame, 32, 18, &snap).unwrap();
//! ```
//!
//! # Used By
//!
//! - `lumen-cli` - `apply` command
//! - `lumen-bench` - pipeline benchmarks

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod capture;
pub mod exchange;
pub mod filter;
pub mod matrix;
pub mod pipeline;
pub mod snapshot;
pub mod watermark;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use capture::{CaptureOptions, process_capture};
pub use error::{OpsError, OpsResult};
pub use exchange::FrameExchange;
pub use filter::{FilterPreset, grade_matrix};
pub use matrix::ColorMatrix;
pub use snapshot::{CurveLuts, GradeSnapshot, SnapshotCell};
pub use watermark::{WatermarkConfig, WatermarkLayout};
