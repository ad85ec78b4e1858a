//! In-place grading of packed `0xAARRGGBB` buffers.
//!
//! Per pixel: color matrix (if any), then curve tables (if any curve is
//! active). Alpha passes through untouched.
//!
//! Everything that depends on the configuration is decided once per call.
//! Present curve LUTs are fused into three 256-byte tables
//! ([`FusedTables`]) and one of three specialised loops runs, so the inner
//! loop has no branches on the grade.
//!
//! # Example
//!
//! ```rust
//! use lumen_ops::{CurveLuts, pipeline};
//!
//! let mut pixels = vec![0xFF80_4020u32; 4 * 2];
//! pipeline::apply(&mut pixels, 4, 2, None, &CurveLuts::none()).unwrap();
//! assert_eq!(pixels[0], 0xFF80_4020);
//! ```

use lumen_core::ArgbImage;
use lumen_core::pixel;
use tracing::debug;

use crate::error::{OpsResult, check_buffer};
use crate::matrix::ColorMatrix;
use crate::snapshot::{CurveLuts, FusedTables, GradeSnapshot};

#[cfg(feature = "parallel")]
pub use crate::parallel::{apply_parallel, apply_snapshot_parallel};

/// Grades `pixels` in place.
///
/// `matrix` is applied first with clamping to `[0, 255]` and truncation.
/// The curves are applied only when at least one present LUT passes
/// [`Lut256::is_active`](lumen_lut::Lut256::is_active); then every present
/// LUT is used, composite before the per-channel ones.
///
/// # Errors
///
/// [`OpsError::SizeMismatch`](crate::OpsError::SizeMismatch) when
/// `pixels.len() != width * height`.
pub fn apply(
    pixels: &mut [u32],
    width: u32,
    height: u32,
    matrix: Option<&ColorMatrix>,
    luts: &CurveLuts,
) -> OpsResult<()> {
    check_buffer(pixels.len(), width, height)?;
    let fused = luts.fuse();
    debug!(
        width,
        height,
        matrix = matrix.is_some(),
        curves = fused.is_some(),
        "apply"
    );
    Plan::new(matrix, fused.as_ref()).run(pixels);
    Ok(())
}

/// Grades `pixels` with a precomputed snapshot.
pub fn apply_snapshot(pixels: &mut [u32], width: u32, height: u32, snapshot: &GradeSnapshot) -> OpsResult<()> {
    check_buffer(pixels.len(), width, height)?;
    debug!(width, height, filter = %snapshot.filter(), saturation = snapshot.saturation(), "apply_snapshot");
    Plan::from_snapshot(snapshot).run(pixels);
    Ok(())
}

/// Grades an image in place, using rayon when the `parallel` feature is on.
pub fn apply_image(image: &mut ArgbImage, snapshot: &GradeSnapshot) -> OpsResult<()> {
    let (width, height) = image.dimensions();
    #[cfg(feature = "parallel")]
    {
        apply_snapshot_parallel(image.pixels_mut(), width, height, snapshot)
    }
    #[cfg(not(feature = "parallel"))]
    {
        apply_snapshot(image.pixels_mut(), width, height, snapshot)
    }
}

/// Matrix coefficients for the RGB rows, unpacked once.
#[derive(Clone, Copy)]
pub(crate) struct Coeffs {
    r: [f32; 4],
    g: [f32; 4],
    b: [f32; 4],
}

impl Coeffs {
    fn new(matrix: &ColorMatrix) -> Self {
        let m = matrix.as_array();
        Self {
            r: [m[0], m[1], m[2], m[4]],
            g: [m[5], m[6], m[7], m[9]],
            b: [m[10], m[11], m[12], m[14]],
        }
    }

    #[inline(always)]
    fn apply(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        (
            row(&self.r, r, g, b),
            row(&self.g, r, g, b),
            row(&self.b, r, g, b),
        )
    }
}

#[inline(always)]
fn row(k: &[f32; 4], r: f32, g: f32, b: f32) -> u8 {
    let v = r * k[0] + g * k[1] + b * k[2] + k[3];
    v.clamp(0.0, 255.0) as u8
}

/// Which loop runs, chosen once per call.
#[derive(Clone, Copy)]
pub(crate) enum Plan<'a> {
    Noop,
    Matrix(Coeffs),
    Curves(&'a FusedTables),
    Both(Coeffs, &'a FusedTables),
}

impl<'a> Plan<'a> {
    pub(crate) fn new(matrix: Option<&ColorMatrix>, fused: Option<&'a FusedTables>) -> Self {
        match (matrix.map(Coeffs::new), fused) {
            (None, None) => Plan::Noop,
            (Some(c), None) => Plan::Matrix(c),
            (None, Some(t)) => Plan::Curves(t),
            (Some(c), Some(t)) => Plan::Both(c, t),
        }
    }

    pub(crate) fn from_snapshot(snapshot: &'a GradeSnapshot) -> Self {
        Self::new(snapshot.matrix(), snapshot.fused())
    }

    pub(crate) fn run(self, pixels: &mut [u32]) {
        match self {
            Plan::Noop => {}
            Plan::Matrix(c) => each(pixels, |r, g, b| c.apply(r, g, b)),
            Plan::Curves(t) => each(pixels, |r, g, b| t.lookup(r, g, b)),
            Plan::Both(c, t) => each(pixels, |r, g, b| {
                let (r, g, b) = c.apply(r, g, b);
                t.lookup(r, g, b)
            }),
        }
    }
}

#[inline(always)]
fn each(pixels: &mut [u32], f: impl Fn(u8, u8, u8) -> (u8, u8, u8)) {
    for px in pixels.iter_mut() {
        let (r, g, b) = f(pixel::red(*px), pixel::green(*px), pixel::blue(*px));
        *px = pixel::with_rgb(*px, r, g, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpsError;
    use crate::filter::FilterPreset;
    use lumen_lut::{Channel, CurveModel, Lut256};

    fn table(f: impl Fn(usize) -> u8) -> Lut256 {
        Lut256::from_table(std::array::from_fn(f))
    }

    #[test]
    fn identity_law() {
        let original: Vec<u32> = (0..64u32).map(|i| i.wrapping_mul(0x0103_0507) | 0x8000_0000).collect();
        let mut px = original.clone();
        let luts = CurveLuts::from_model(&CurveModel::new());
        apply(&mut px, 8, 8, None, &luts).unwrap();
        assert_eq!(px, original);
        apply(&mut px, 8, 8, Some(&ColorMatrix::IDENTITY), &luts).unwrap();
        assert_eq!(px, original);
    }

    #[test]
    fn clamp_and_alpha() {
        let boost = ColorMatrix::new([
            2.0, 0.0, 0.0, 0.0, 10.0, //
            0.0, 1.0, 0.0, 0.0, -300.0, //
            0.0, 0.0, 0.5, 0.0, 0.3, //
            0.0, 0.0, 0.0, 0.0, 0.0,
        ]);
        let mut px = vec![pixel::pack(0x12, 200, 100, 51)];
        apply(&mut px, 1, 1, Some(&boost), &CurveLuts::none()).unwrap();
        // 200*2+10 clamps high, 100-300 clamps low, 51*0.5+0.3 = 25.8 truncates.
        assert_eq!(px[0], pixel::pack(0x12, 255, 0, 25));
    }

    #[test]
    fn composite_runs_before_channel_curve() {
        // Swap the order and the red result differs.
        let invert = table(|i| 255 - i as u8);
        let half = table(|i| (i / 2) as u8);
        let luts = CurveLuts {
            rgb: Some(invert),
            red: Some(half),
            ..CurveLuts::none()
        };
        let mut px = vec![pixel::pack(0xFF, 10, 10, 10)];
        apply(&mut px, 1, 1, None, &luts).unwrap();
        assert_eq!(pixel::red(px[0]), 122);
        assert_ne!(pixel::red(px[0]), 255 - 5);
        assert_eq!(pixel::green(px[0]), 245);
    }

    #[test]
    fn inactive_curves_are_skipped() {
        // lut[128] within 2 of 128 but level 0 remapped.
        let mut t = *Lut256::IDENTITY.as_array();
        t[0] = 200;
        let luts = CurveLuts {
            rgb: Some(Lut256::from_table(t)),
            ..CurveLuts::none()
        };
        let mut px = vec![pixel::pack(0xFF, 0, 0, 0)];
        apply(&mut px, 1, 1, None, &luts).unwrap();
        assert_eq!(px[0], pixel::pack(0xFF, 0, 0, 0));
    }

    #[test]
    fn matrix_then_curves() {
        let grey = ColorMatrix::saturation(0.0);
        let luts = CurveLuts {
            rgb: Some(table(|i| (i / 2) as u8)),
            ..CurveLuts::none()
        };
        let mut px = vec![pixel::pack(0xFF, 0, 0, 0), pixel::pack(0xFF, 255, 255, 255)];
        apply(&mut px, 2, 1, Some(&grey), &luts).unwrap();
        assert_eq!(px[0], pixel::pack(0xFF, 0, 0, 0));
        // Grey of white is 254 or 255 depending on f32 rounding; halved either way.
        assert_eq!(px[1], pixel::pack(0xFF, 127, 127, 127));
    }

    #[test]
    fn size_mismatch() {
        let mut px = vec![0u32; 5];
        let err = apply(&mut px, 2, 3, None, &CurveLuts::none()).unwrap_err();
        assert!(matches!(err, OpsError::SizeMismatch { expected: 6, actual: 5 }));
    }

    #[test]
    fn empty_buffer_is_fine() {
        let mut px: Vec<u32> = Vec::new();
        apply(&mut px, 0, 0, Some(&ColorMatrix::IDENTITY), &CurveLuts::none()).unwrap();
    }

    #[test]
    fn snapshot_matches_explicit_parts() {
        let mut model = CurveModel::new();
        model.spline_mut(Channel::Green).insert(0.5, 0.3);
        model.set_saturation(-40);
        let snap = GradeSnapshot::new(&model, FilterPreset::Warm);
        let src: Vec<u32> = (0..256u32).map(|i| pixel::pack(0xFF, i as u8, (255 - i) as u8, (i * 7) as u8)).collect();

        let mut a = src.clone();
        apply_snapshot(&mut a, 16, 16, &snap).unwrap();
        let mut b = src;
        apply(&mut b, 16, 16, snap.matrix(), snap.luts()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn image_variant() {
        let mut img = ArgbImage::filled(3, 2, pixel::pack(0x40, 255, 0, 0)).unwrap();
        let snap = GradeSnapshot::new(&CurveModel::new(), FilterPreset::BlackWhite);
        apply_image(&mut img, &snap).unwrap();
        let p = img.pixel(2, 1);
        assert_eq!(pixel::alpha(p), 0x40);
        assert_eq!(pixel::red(p), pixel::green(p));
        assert_eq!(pixel::red(p), 54); // 0.213 * 255 = 54.3
    }
}
