//! Filter looks: one constant [`ColorMatrix`] per [`FilterPreset`].
//!
//! New looks are added by extending [`FilterPreset`] and [`FILTER_TABLE`];
//! nothing else branches on the variant.
//!
//! Several looks are named but currently map to the identity matrix. They
//! still count as "a filter is set" when deciding whether the pipeline runs
//! its matrix step, which is harmless since the identity leaves 8-bit
//! values unchanged.

use std::fmt;

use crate::matrix::{ColorMatrix, saturation_scale};

/// Named color look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FilterPreset {
    /// No look.
    #[default]
    None,
    /// Saturation 1.4.
    Vivid,
    /// Saturation 0.85.
    Matte,
    /// Greyscale.
    BlackWhite,
    /// Classic sepia mix.
    Sepia,
    /// Red and blue push, green pull.
    Cyberpunk,
    /// Warm channel gains.
    Warm,
    /// Cool channel gains.
    Cool,
    /// Reserved look (identity).
    Vintage,
    /// Instant-film gains.
    Polaroid,
    /// Reserved look (identity).
    Kodak,
    /// Slight green/blue cross-talk.
    FujiSuperia,
    /// High-contrast monochrome.
    LeicaM,
    /// Reserved look (identity).
    Dramatic,
    /// Reserved look (identity).
    Pastel,
    /// Reserved look (identity).
    Noir,
    /// Reserved look (identity).
    Silver,
    /// Reserved look (identity).
    Golden,
    /// Teal shadows / orange skin split.
    TealOrange,
    /// Reserved look (identity).
    Faded,
    /// Reserved look (identity).
    Hdr,
    /// Reserved look (identity).
    Cinematic,
}

/// Number of looks.
pub const FILTER_COUNT: usize = 22;

const ID: ColorMatrix = ColorMatrix::IDENTITY;

/// Matrix per look, indexed by `FilterPreset as usize`.
pub const FILTER_TABLE: [ColorMatrix; FILTER_COUNT] = [
    // None
    ID,
    // Vivid
    ColorMatrix::saturation(1.4),
    // Matte
    ColorMatrix::saturation(0.85),
    // BlackWhite
    ColorMatrix::saturation(0.0),
    // Sepia
    ColorMatrix::new([
        0.393, 0.769, 0.189, 0.0, 0.0, //
        0.349, 0.686, 0.168, 0.0, 0.0, //
        0.272, 0.534, 0.131, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]),
    // Cyberpunk
    ColorMatrix::scale(1.2, 0.9, 1.3),
    // Warm
    ColorMatrix::scale(1.1, 1.05, 0.9),
    // Cool
    ColorMatrix::scale(0.9, 1.0, 1.15),
    // Vintage
    ID,
    // Polaroid
    ColorMatrix::scale(1.1, 1.05, 0.9),
    // Kodak
    ID,
    // FujiSuperia
    ColorMatrix::new([
        1.05, -0.05, 0.0, 0.0, 0.0, //
        0.0, 1.05, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.1, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]),
    // LeicaM: greyscale, then 1.3 gain with a -20 offset.
    ColorMatrix::saturation(0.0).then(&ColorMatrix::new([
        1.3, 0.0, 0.0, 0.0, -20.0, //
        0.0, 1.3, 0.0, 0.0, -20.0, //
        0.0, 0.0, 1.3, 0.0, -20.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ])),
    // Dramatic
    ID,
    // Pastel
    ID,
    // Noir
    ID,
    // Silver
    ID,
    // Golden
    ID,
    // TealOrange
    ColorMatrix::scale(1.1, 1.0, 0.8),
    // Faded
    ID,
    // Hdr
    ID,
    // Cinematic
    ID,
];

impl FilterPreset {
    /// Every look in table order.
    pub const ALL: [FilterPreset; FILTER_COUNT] = [
        FilterPreset::None,
        FilterPreset::Vivid,
        FilterPreset::Matte,
        FilterPreset::BlackWhite,
        FilterPreset::Sepia,
        FilterPreset::Cyberpunk,
        FilterPreset::Warm,
        FilterPreset::Cool,
        FilterPreset::Vintage,
        FilterPreset::Polaroid,
        FilterPreset::Kodak,
        FilterPreset::FujiSuperia,
        FilterPreset::LeicaM,
        FilterPreset::Dramatic,
        FilterPreset::Pastel,
        FilterPreset::Noir,
        FilterPreset::Silver,
        FilterPreset::Golden,
        FilterPreset::TealOrange,
        FilterPreset::Faded,
        FilterPreset::Hdr,
        FilterPreset::Cinematic,
    ];

    /// Matrix for this look.
    #[inline]
    pub const fn matrix(self) -> ColorMatrix {
        FILTER_TABLE[self as usize]
    }

    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterPreset::None => "none",
            FilterPreset::Vivid => "vivid",
            FilterPreset::Matte => "matte",
            FilterPreset::BlackWhite => "black-white",
            FilterPreset::Sepia => "sepia",
            FilterPreset::Cyberpunk => "cyberpunk",
            FilterPreset::Warm => "warm",
            FilterPreset::Cool => "cool",
            FilterPreset::Vintage => "vintage",
            FilterPreset::Polaroid => "polaroid",
            FilterPreset::Kodak => "kodak",
            FilterPreset::FujiSuperia => "fuji-superia",
            FilterPreset::LeicaM => "leica-m",
            FilterPreset::Dramatic => "dramatic",
            FilterPreset::Pastel => "pastel",
            FilterPreset::Noir => "noir",
            FilterPreset::Silver => "silver",
            FilterPreset::Golden => "golden",
            FilterPreset::TealOrange => "teal-orange",
            FilterPreset::Faded => "faded",
            FilterPreset::Hdr => "hdr",
            FilterPreset::Cinematic => "cinematic",
        }
    }

    /// Parses a name; case, `_` and `-` are ignored (`"B_W"` is accepted).
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if key == "bw" {
            return Some(FilterPreset::BlackWhite);
        }
        Self::ALL.into_iter().find(|f| f.as_str().replace('-', "") == key)
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined filter and saturation transform.
///
/// `None` when the look is [`FilterPreset::None`] and saturation is 0.
/// Otherwise the look's matrix followed by the saturation matrix for
/// `1 + saturation/100` (floored at 0), folded into one affine transform
/// so the pipeline clamps once.
pub fn grade_matrix(filter: FilterPreset, saturation: i32) -> Option<ColorMatrix> {
    if filter == FilterPreset::None && saturation == 0 {
        return None;
    }
    let look = filter.matrix();
    if saturation == 0 {
        return Some(look);
    }
    Some(look.then(&ColorMatrix::saturation(saturation_scale(saturation))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn table_order_matches_enum() {
        for (i, f) in FilterPreset::ALL.iter().enumerate() {
            assert_eq!(*f as usize, i);
        }
    }

    #[test]
    fn identity_looks() {
        use FilterPreset::*;
        for f in [None, Vintage, Kodak, Dramatic, Pastel, Noir, Silver, Golden, Faded, Hdr, Cinematic] {
            assert!(f.matrix().is_identity(), "{f}");
        }
        for f in [Vivid, Matte, BlackWhite, Sepia, Cyberpunk, Warm, Cool, Polaroid, FujiSuperia, LeicaM, TealOrange] {
            assert!(!f.matrix().is_identity(), "{f}");
        }
    }

    #[test]
    fn sepia_row() {
        let [r, _, _] = FilterPreset::Sepia.matrix().transform([100.0, 100.0, 100.0]);
        assert_abs_diff_eq!(r, 135.1, epsilon = 1e-3);
    }

    #[test]
    fn leica_is_monochrome_with_offset() {
        let [r, g, b] = FilterPreset::LeicaM.matrix().transform([0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(r, -20.0, epsilon = 1e-6);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn no_matrix_when_neutral() {
        assert!(grade_matrix(FilterPreset::None, 0).is_none());
        assert!(grade_matrix(FilterPreset::Vintage, 0).is_some());
        assert!(grade_matrix(FilterPreset::None, 1).is_some());
    }

    #[test]
    fn filter_then_saturation() {
        let m = grade_matrix(FilterPreset::Warm, -100).unwrap();
        let expected = ColorMatrix::saturation(0.0).transform(ColorMatrix::scale(1.1, 1.05, 0.9).transform([200.0, 80.0, 30.0]));
        let got = m.transform([200.0, 80.0, 30.0]);
        for k in 0..3 {
            assert_abs_diff_eq!(got[k], expected[k], epsilon = 1e-3);
        }
    }

    #[test]
    fn names_round_trip() {
        for f in FilterPreset::ALL {
            assert_eq!(FilterPreset::parse(f.as_str()), Some(f));
        }
        assert_eq!(FilterPreset::parse("B_W"), Some(FilterPreset::BlackWhite));
        assert_eq!(FilterPreset::parse("TEAL_ORANGE"), Some(FilterPreset::TealOrange));
        assert_eq!(FilterPreset::parse("lomo"), None);
    }
}
