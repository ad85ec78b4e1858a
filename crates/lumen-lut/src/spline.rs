//! Tone-curve control points and splines.
//!
//! Points live in canvas space: both coordinates are in `[0, 1]` and `y`
//! grows downward, so the default spline `(0, 1) -> (1, 0)` is the
//! identity curve once [`Lut256::generate`](crate::Lut256::generate)
//! applies its vertical flip.
//!
//! Editing keeps these invariants:
//!
//! - at least 2 and at most [`MAX_POINTS`] points, sorted by `x`
//! - endpoint `x` pinned to 0 and 1 when dragged
//! - interior points never get closer than [`MIN_GAP`] to a neighbour
//!
//! Splines decoded from files are only sorted and clamped; their
//! endpoints are taken as stored.

use crate::lut::Lut256;

/// Maximum number of points an edit may create.
pub const MAX_POINTS: usize = 10;

/// Minimum horizontal distance between neighbours after an edit.
pub const MIN_GAP: f32 = 0.01;

/// Euclidean distance under which a press selects an existing point.
pub const HIT_RADIUS: f32 = 0.1;

/// A curve anchor in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPoint {
    /// Input level, 0 = black.
    pub x: f32,
    /// Output level, canvas space (0 = top = white).
    pub y: f32,
}

impl ControlPoint {
    /// Creates a point without clamping.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Creates a point with both coordinates clamped to `[0, 1]`.
    pub fn clamped(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    fn distance(&self, x: f32, y: f32) -> f32 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Ordered control points of one channel's curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    points: Vec<ControlPoint>,
}

const DEFAULT_POINTS: [ControlPoint; 2] = [ControlPoint::new(0.0, 1.0), ControlPoint::new(1.0, 0.0)];

impl Default for Spline {
    fn default() -> Self {
        Self {
            points: DEFAULT_POINTS.to_vec(),
        }
    }
}

impl Spline {
    /// Builds a spline from arbitrary points.
    ///
    /// Non-finite points are dropped, coordinates are clamped to `[0, 1]`
    /// and the result is sorted by `x`. Fewer than two surviving points
    /// yields the default spline.
    pub fn from_points(points: impl IntoIterator<Item = ControlPoint>) -> Self {
        let mut points: Vec<ControlPoint> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| ControlPoint::clamped(p.x, p.y))
            .collect();
        if points.len() < 2 {
            return Self::default();
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { points }
    }

    /// Control points, sorted by `x`.
    #[inline]
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; a spline holds at least two points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `true` when this is exactly the two-point default.
    pub fn is_default(&self) -> bool {
        self.points == DEFAULT_POINTS
    }

    /// Index of the first point within [`HIT_RADIUS`] of `(x, y)`.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.points.iter().position(|p| p.distance(x, y) < HIT_RADIUS)
    }

    /// Inserts a point at its sorted position and returns its index.
    ///
    /// Returns `None` when the spline is full or the neighbouring points
    /// leave no room for a [`MIN_GAP`] on both sides. New points are always
    /// interior, so `x` is clamped between the neighbours.
    pub fn insert(&mut self, x: f32, y: f32) -> Option<usize> {
        if self.points.len() >= MAX_POINTS {
            return None;
        }
        let p = ControlPoint::clamped(x, y);
        let last = self.points.len() - 1;
        let index = self.points.partition_point(|q| q.x <= p.x).clamp(1, last);
        let lo = self.points[index - 1].x + MIN_GAP;
        let hi = self.points[index].x - MIN_GAP;
        if lo > hi {
            return None;
        }
        self.points.insert(index, ControlPoint::new(p.x.clamp(lo, hi), p.y));
        Some(index)
    }

    /// Moves point `index` to `(x, y)` under the editing rules.
    ///
    /// Endpoints keep `x` pinned to 0 or 1; interior points are clamped to
    /// `[prev.x + MIN_GAP, next.x - MIN_GAP]`. Returns `false` for an
    /// out-of-range index.
    pub fn move_point(&mut self, index: usize, x: f32, y: f32) -> bool {
        let last = self.points.len() - 1;
        if index > last {
            return false;
        }
        let target = ControlPoint::clamped(x, y);
        let new_x = if index == 0 {
            0.0
        } else if index == last {
            1.0
        } else {
            let prev = self.points[index - 1].x;
            let next = self.points[index + 1].x;
            (prev + MIN_GAP).max((next - MIN_GAP).min(target.x))
        };
        self.points[index] = ControlPoint::new(new_x, target.y);
        true
    }

    /// Restores the two-point default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generates this spline's lookup table.
    pub fn lut(&self) -> Lut256 {
        Lut256::generate(&self.points)
    }
}
