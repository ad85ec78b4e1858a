//! # lumen-lut
//!
//! Tone curves for the lumen grading pipeline.
//!
//! A curve is a [`Spline`] of 2 to 10 [`ControlPoint`]s in canvas space
//! (y grows downward). Each spline evaluates to a [`Lut256`], an 8-bit
//! table the pixel pipeline indexes directly.
//!
//! # Modules
//!
//! - [`spline`] - control points and editing rules
//! - [`lut`] - LUT generation and the active-curve heuristic
//! - [`model`] - [`CurveModel`]: four channels plus saturation
//! - [`editor`] - [`CurveEditor`]: press/drag/release gestures
//! - [`preset`] - [`CurvePreset`] snapshots and [`PresetLibrary`]
//! - [`xmp`] - Camera Raw tone-curve XMP codec
//!
//! # Usage
//!
//! ```rust
//! use lumen_lut::{Channel, CurveModel, xmp};
//!
//! let mut model = CurveModel::new();
//! model.spline_mut(Channel::Rgb).insert(0.5, 0.35);
//! model.set_saturation(15);
//!
//! let luts = model.luts();
//! assert!(luts[0].is_active());
//!
//! let text = xmp::encode(&model.to_preset("Lift"));
//! let back = xmp::decode(&text);
//! assert_eq!(back.saturation, 15);
//! ```
//!
//! # Used By
//!
//! - `lumen-ops` - builds grade snapshots from curve LUTs
//! - `lumen-cli` - `lut` and `preset` commands

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod editor;
pub mod lut;
pub mod model;
pub mod preset;
pub mod spline;
pub mod xmp;

pub use editor::CurveEditor;
pub use error::{LutError, LutResult};
pub use lut::{Lut256, LUT_SIZE, generate_lut};
pub use model::{Channel, CurveModel};
pub use preset::{CurvePreset, PresetLibrary};
pub use spline::{ControlPoint, Spline};
pub use xmp::{read_xmp, write_xmp};
