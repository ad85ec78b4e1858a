//! Packed 32-bit ARGB pixels.
//!
//! Every buffer in lumen stores one `u32` per pixel laid out as
//! `0xAARRGGBB`, row-major. The helpers here split and join the four
//! bytes without touching the alpha channel unless asked to.
//!
//! ```
//! use lumen_core::pixel::{pack, unpack};
//!
//! let p = pack(0x80, 10, 20, 30);
//! assert_eq!(p, 0x800A_141E);
//! assert_eq!(unpack(p), (0x80, 10, 20, 30));
//! ```

/// Opaque black.
pub const BLACK: u32 = 0xFF00_0000;

/// Opaque white.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Joins alpha, red, green and blue bytes into `0xAARRGGBB`.
#[inline(always)]
pub const fn pack(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Splits `0xAARRGGBB` into `(a, r, g, b)`.
#[inline(always)]
pub const fn unpack(p: u32) -> (u8, u8, u8, u8) {
    ((p >> 24) as u8, (p >> 16) as u8, (p >> 8) as u8, p as u8)
}

/// Alpha byte.
#[inline(always)]
pub const fn alpha(p: u32) -> u8 {
    (p >> 24) as u8
}

/// Red byte.
#[inline(always)]
pub const fn red(p: u32) -> u8 {
    (p >> 16) as u8
}

/// Green byte.
#[inline(always)]
pub const fn green(p: u32) -> u8 {
    (p >> 8) as u8
}

/// Blue byte.
#[inline(always)]
pub const fn blue(p: u32) -> u8 {
    p as u8
}

/// Replaces the color bytes of `p`, keeping its alpha bits.
#[inline(always)]
pub const fn with_rgb(p: u32, r: u8, g: u8, b: u8) -> u32 {
    (p & 0xFF00_0000) | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Parses `#RRGGBB` or `#AARRGGBB` (leading `#` optional) into a packed
/// pixel. Six-digit forms are opaque.
pub fn parse_hex(s: &str) -> Option<u32> {
    let hex = s.trim().trim_start_matches('#');
    let v = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        6 => Some(0xFF00_0000 | v),
        8 => Some(v),
        _ => None,
    }
}
