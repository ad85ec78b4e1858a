//! 256-entry 8-bit lookup tables generated from splines.
//!
//! # Algorithm
//!
//! 1. Fewer than two points yields an all-zero table.
//! 2. Each point maps to sample space with a vertical flip:
//!    `sx = x * 255`, `sy = (1 - y) * 255`.
//! 3. For every level `i`: levels at or before the first sample take its
//!    `sy`, levels at or after the last take the last `sy`, everything in
//!    between is linearly interpolated inside its bracketing segment.
//! 4. The value is clamped to `[0, 255]` and truncated.
//!
//! All arithmetic is `f32` so truncation lands on the same integers as
//! other single-precision implementations of the same curve format.
//!
//! # Example
//!
//! ```rust
//! use lumen_lut::{ControlPoint, Lut256};
//!
//! let lut = Lut256::generate(&[ControlPoint::new(0.0, 1.0), ControlPoint::new(1.0, 0.0)]);
//! assert_eq!(lut[0], 0);
//! assert_eq!(lut[255], 255);
//! assert!(!lut.is_active());
//! ```

use std::fmt;
use std::ops::Index;

use crate::spline::ControlPoint;

/// Number of entries in a tone LUT.
pub const LUT_SIZE: usize = 256;

/// Maximum distance of `lut[128]` from 128 for a curve to count as a no-op.
pub const ACTIVE_THRESHOLD: i32 = 2;

/// 8-bit lookup table, one output level per input level.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lut256([u8; LUT_SIZE]);

impl Lut256 {
    /// `lut[i] == i`.
    pub const IDENTITY: Self = {
        let mut t = [0u8; LUT_SIZE];
        let mut i = 0;
        while i < LUT_SIZE {
            t[i] = i as u8;
            i += 1;
        }
        Self(t)
    };

    /// All zeros, produced by degenerate splines.
    pub const ZERO: Self = Self([0; LUT_SIZE]);

    /// Wraps a precomputed table.
    pub const fn from_table(table: [u8; LUT_SIZE]) -> Self {
        Self(table)
    }

    /// Evaluates `points` (canvas space, sorted by `x`) into a table.
    pub fn generate(points: &[ControlPoint]) -> Self {
        if points.len() < 2 {
            return Self::ZERO;
        }
        let xs: Vec<f32> = points.iter().map(|p| p.x * 255.0).collect();
        let ys: Vec<f32> = points.iter().map(|p| (1.0 - p.y) * 255.0).collect();

        let mut table = [0u8; LUT_SIZE];
        for (i, out) in table.iter_mut().enumerate() {
            let v = interpolate(i as f32, &xs, &ys);
            // `as` truncates toward zero; NaN lands on 0.
            *out = v.clamp(0.0, 255.0) as u8;
        }
        Self(table)
    }

    /// Cheap no-op test: `|lut[128] - 128| > 2`.
    ///
    /// A curve that bends only away from the midpoint still reports
    /// inactive. Use it to skip work, never to decide correctness.
    #[inline]
    pub fn is_active(&self) -> bool {
        (self.0[128] as i32 - 128).abs() > ACTIVE_THRESHOLD
    }

    /// Looks up one level.
    #[inline(always)]
    pub fn apply(&self, v: u8) -> u8 {
        self.0[v as usize]
    }

    /// Table composed with `next`: `out[i] = next[self[i]]`.
    pub fn then(&self, next: &Lut256) -> Lut256 {
        let mut t = [0u8; LUT_SIZE];
        for (o, &v) in t.iter_mut().zip(self.0.iter()) {
            *o = next.0[v as usize];
        }
        Self(t)
    }

    /// Raw table.
    #[inline]
    pub fn as_array(&self) -> &[u8; LUT_SIZE] {
        &self.0
    }
}

impl Default for Lut256 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Index<usize> for Lut256 {
    type Output = u8;

    #[inline(always)]
    fn index(&self, i: usize) -> &u8 {
        &self.0[i]
    }
}

impl fmt::Debug for Lut256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lut256")
            .field("lut[0]", &self.0[0])
            .field("lut[128]", &self.0[128])
            .field("lut[255]", &self.0[255])
            .field("active", &self.is_active())
            .finish()
    }
}

/// Free-function form of [`Lut256::generate`].
pub fn generate_lut(points: &[ControlPoint]) -> Lut256 {
    Lut256::generate(points)
}

fn interpolate(v: f32, xs: &[f32], ys: &[f32]) -> f32 {
    let last = xs.len() - 1;
    if v <= xs[0] {
        return ys[0];
    }
    if v >= xs[last] {
        return ys[last];
    }
    let mut k = 0;
    while v > xs[k + 1] {
        k += 1;
    }
    let t = (v - xs[k]) / (xs[k + 1] - xs[k]);
    ys[k] + t * (ys[k + 1] - ys[k])
}
