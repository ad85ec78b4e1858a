//! 4x5 affine color matrix.
//!
//! Row-major, 20 coefficients. Row `k` produces channel `k` (R, G, B, A)
//! as `m[5k]*r + m[5k+1]*g + m[5k+2]*b + m[5k+3]*a + m[5k+4]`, with
//! channels in the 0..=255 range so the last column is an offset in
//! 8-bit units.
//!
//! Everything here is `const fn`, which lets the filter table be a plain
//! constant.
//!
//! # Example
//!
//! ```rust
//! use lumen_ops::ColorMatrix;
//!
//! let warm = ColorMatrix::scale(1.1, 1.05, 0.9);
//! let grey = ColorMatrix::saturation(0.0);
//! // Warm first, then desaturate.
//! let m = warm.then(&grey);
//! let [r, g, b] = m.transform([200.0, 100.0, 50.0]);
//! assert!((r - g).abs() < 1e-3 && (g - b).abs() < 1e-3);
//! ```

/// Rec.709-derived luminance weights used by the saturation matrix.
pub const LUMA_WEIGHTS: [f32; 3] = [0.213, 0.715, 0.072];

/// 4x5 row-major affine color transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([f32; 20]);

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    /// No-op transform.
    pub const IDENTITY: Self = Self::scale4(1.0, 1.0, 1.0, 1.0);

    /// Wraps raw coefficients.
    pub const fn new(m: [f32; 20]) -> Self {
        Self(m)
    }

    /// Per-channel gain, alpha untouched.
    pub const fn scale(r: f32, g: f32, b: f32) -> Self {
        Self::scale4(r, g, b, 1.0)
    }

    const fn scale4(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([
            r, 0.0, 0.0, 0.0, 0.0, //
            0.0, g, 0.0, 0.0, 0.0, //
            0.0, 0.0, b, 0.0, 0.0, //
            0.0, 0.0, 0.0, a, 0.0,
        ])
    }

    /// Luminance-preserving saturation: 0 is greyscale, 1 is identity.
    pub const fn saturation(s: f32) -> Self {
        let inv = 1.0 - s;
        let r = LUMA_WEIGHTS[0] * inv;
        let g = LUMA_WEIGHTS[1] * inv;
        let b = LUMA_WEIGHTS[2] * inv;
        Self([
            r + s, g, b, 0.0, 0.0, //
            r, g + s, b, 0.0, 0.0, //
            r, g, b + s, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Matrix product `a * b`: applies `b` first, then `a`.
    pub const fn concat(a: &Self, b: &Self) -> Self {
        let a = &a.0;
        let b = &b.0;
        let mut out = [0.0f32; 20];
        let mut j = 0;
        while j < 20 {
            let mut i = 0;
            while i < 4 {
                out[j + i] = a[j] * b[i] + a[j + 1] * b[i + 5] + a[j + 2] * b[i + 10] + a[j + 3] * b[i + 15];
                i += 1;
            }
            out[j + 4] = a[j] * b[4] + a[j + 1] * b[9] + a[j + 2] * b[14] + a[j + 3] * b[19] + a[j + 4];
            j += 5;
        }
        Self(out)
    }

    /// `self` followed by `next`, as one transform.
    pub const fn then(&self, next: &Self) -> Self {
        Self::concat(next, self)
    }

    /// Raw coefficients.
    #[inline]
    pub const fn as_array(&self) -> &[f32; 20] {
        &self.0
    }

    /// Applies the RGB rows without clamping (alpha column ignored).
    pub fn transform(&self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            r * m[0] + g * m[1] + b * m[2] + m[4],
            r * m[5] + g * m[6] + b * m[7] + m[9],
            r * m[10] + g * m[11] + b * m[12] + m[14],
        ]
    }

    /// `true` when every coefficient matches the identity.
    pub fn is_identity(&self) -> bool {
        self.0 == Self::IDENTITY.0
    }
}

/// Saturation slider (`-100..=100`) to matrix scale: `1 + s/100`, floored at 0.
#[inline]
pub fn saturation_scale(saturation: i32) -> f32 {
    (1.0 + saturation as f32 / 100.0).max(0.0)
}
