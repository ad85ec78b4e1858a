//! Immutable grading state shared between the editing and frame paths.
//!
//! Editors never touch LUTs in place. They build a fresh
//! [`GradeSnapshot`] and swap it into a [`SnapshotCell`]; the frame worker
//! clones the `Arc` once per frame and keeps using that snapshot even if a
//! newer one lands mid-frame.

use std::sync::Arc;

use lumen_lut::{Channel, CurveModel, LUT_SIZE, Lut256};
use parking_lot::RwLock;

use crate::filter::{FilterPreset, grade_matrix};
use crate::matrix::ColorMatrix;

/// Up to four curve LUTs. Absent entries are skipped by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurveLuts {
    /// Composite, applied to all channels first.
    pub rgb: Option<Lut256>,
    /// Red channel.
    pub red: Option<Lut256>,
    /// Green channel.
    pub green: Option<Lut256>,
    /// Blue channel.
    pub blue: Option<Lut256>,
}

impl CurveLuts {
    /// No curves.
    pub const fn none() -> Self {
        Self {
            rgb: None,
            red: None,
            green: None,
            blue: None,
        }
    }

    /// All four LUTs present, in [`Channel::ALL`] order.
    pub const fn from_array([rgb, red, green, blue]: [Lut256; 4]) -> Self {
        Self {
            rgb: Some(rgb),
            red: Some(red),
            green: Some(green),
            blue: Some(blue),
        }
    }

    /// LUTs for every channel of `model`.
    pub fn from_model(model: &CurveModel) -> Self {
        Self::from_array(model.luts())
    }

    /// LUT slot for a channel.
    pub fn get(&self, channel: Channel) -> Option<&Lut256> {
        match channel {
            Channel::Rgb => self.rgb.as_ref(),
            Channel::Red => self.red.as_ref(),
            Channel::Green => self.green.as_ref(),
            Channel::Blue => self.blue.as_ref(),
        }
    }

    /// `true` when any present LUT passes [`Lut256::is_active`].
    pub fn any_active(&self) -> bool {
        [self.rgb, self.red, self.green, self.blue]
            .iter()
            .flatten()
            .any(Lut256::is_active)
    }

    /// Folds the present LUTs into one table per output channel, composite
    /// first. `None` when no LUT is active, in which case none is applied.
    pub fn fuse(&self) -> Option<FusedTables> {
        if !self.any_active() {
            return None;
        }
        let composite = self.rgb.unwrap_or(Lut256::IDENTITY);
        let chain = |channel: Option<Lut256>| match channel {
            Some(lut) => composite.then(&lut),
            None => composite,
        };
        Some(FusedTables {
            r: *chain(self.red).as_array(),
            g: *chain(self.green).as_array(),
            b: *chain(self.blue).as_array(),
        })
    }
}

/// Per-channel tables with the composite curve already folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusedTables {
    pub(crate) r: [u8; LUT_SIZE],
    pub(crate) g: [u8; LUT_SIZE],
    pub(crate) b: [u8; LUT_SIZE],
}

impl FusedTables {
    /// Maps one channel triple.
    #[inline(always)]
    pub fn lookup(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        (self.r[r as usize], self.g[g as usize], self.b[b as usize])
    }
}

/// Everything the pipeline needs for one frame, computed once.
#[derive(Debug, Clone, Default)]
pub struct GradeSnapshot {
    luts: CurveLuts,
    fused: Option<FusedTables>,
    matrix: Option<ColorMatrix>,
    filter: FilterPreset,
    saturation: i32,
}

impl GradeSnapshot {
    /// Snapshot of `model` with `filter` applied before the curves.
    pub fn new(model: &CurveModel, filter: FilterPreset) -> Self {
        let luts = CurveLuts::from_model(model);
        Self {
            fused: luts.fuse(),
            luts,
            matrix: grade_matrix(filter, model.saturation()),
            filter,
            saturation: model.saturation(),
        }
    }

    /// Snapshot from explicit parts.
    pub fn from_parts(matrix: Option<ColorMatrix>, luts: CurveLuts) -> Self {
        Self {
            fused: luts.fuse(),
            luts,
            matrix,
            ..Self::default()
        }
    }

    /// Pass-through snapshot.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Combined filter and saturation matrix, if any.
    pub fn matrix(&self) -> Option<&ColorMatrix> {
        self.matrix.as_ref()
    }

    /// Source LUTs.
    pub fn luts(&self) -> &CurveLuts {
        &self.luts
    }

    /// Precomputed tables, `None` when no curve is active.
    pub fn fused(&self) -> Option<&FusedTables> {
        self.fused.as_ref()
    }

    /// Look the matrix was built from.
    pub fn filter(&self) -> FilterPreset {
        self.filter
    }

    /// Saturation the matrix was built from.
    pub fn saturation(&self) -> i32 {
        self.saturation
    }

    /// `true` when applying this snapshot leaves pixels untouched.
    pub fn is_noop(&self) -> bool {
        self.matrix.is_none() && self.fused.is_none()
    }
}

/// Compute-then-swap holder for the current [`GradeSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<GradeSnapshot>>,
}

impl SnapshotCell {
    /// Cell holding `snapshot`.
    pub fn new(snapshot: GradeSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot. Cheap: one `Arc` clone under a read lock.
    pub fn load(&self) -> Arc<GradeSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publishes a new snapshot and returns the previous one.
    pub fn store(&self, snapshot: GradeSnapshot) -> Arc<GradeSnapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Rebuilds from `model` and `filter` outside the lock, then swaps.
    pub fn publish(&self, model: &CurveModel, filter: FilterPreset) {
        let snapshot = GradeSnapshot::new(model, filter);
        self.store(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(f: impl Fn(usize) -> u8) -> Lut256 {
        Lut256::from_table(std::array::from_fn(f))
    }

    #[test]
    fn inactive_luts_are_not_fused() {
        let luts = CurveLuts::from_array([Lut256::IDENTITY; 4]);
        assert!(!luts.any_active());
        assert!(luts.fuse().is_none());
        assert!(CurveLuts::none().fuse().is_none());
        // A full inversion has lut[128] == 127 and is skipped.
        let invert = CurveLuts {
            rgb: Some(table(|i| 255 - i as u8)),
            ..CurveLuts::none()
        };
        assert!(invert.fuse().is_none());
    }

    #[test]
    fn fused_applies_composite_first() {
        let invert = table(|i| 255 - i as u8);
        let half = table(|i| (i / 2) as u8);
        let luts = CurveLuts {
            rgb: Some(invert),
            red: Some(half),
            ..CurveLuts::none()
        };
        let fused = luts.fuse().unwrap();
        // r: half(invert(10)) = 122; g, b: invert only.
        assert_eq!(fused.lookup(10, 10, 10), (122, 245, 245));
    }

    #[test]
    fn inactive_present_lut_still_applied_when_another_is_active() {
        // Red looks inactive at the midpoint but changes level 0.
        let mut red = *Lut256::IDENTITY.as_array();
        red[0] = 50;
        let luts = CurveLuts {
            rgb: Some(table(|i| (i / 2) as u8)),
            red: Some(Lut256::from_table(red)),
            ..CurveLuts::none()
        };
        let fused = luts.fuse().unwrap();
        assert_eq!(fused.lookup(0, 0, 0), (50, 0, 0));
        assert_eq!(fused.lookup(1, 1, 1), (0, 0, 0));
    }

    #[test]
    fn default_model_snapshot_is_noop() {
        let snap = GradeSnapshot::new(&CurveModel::new(), FilterPreset::None);
        assert!(snap.is_noop());
        let snap = GradeSnapshot::new(&CurveModel::new(), FilterPreset::Sepia);
        assert!(!snap.is_noop());
        assert_eq!(snap.filter(), FilterPreset::Sepia);
    }

    #[test]
    fn cell_swaps_without_disturbing_readers() {
        let cell = SnapshotCell::new(GradeSnapshot::identity());
        let held = cell.load();
        let mut model = CurveModel::new();
        model.set_saturation(40);
        cell.publish(&model, FilterPreset::Warm);
        assert!(held.is_noop());
        let now = cell.load();
        assert_eq!(now.saturation(), 40);
        assert!(!Arc::ptr_eq(&held, &now));
    }
}
