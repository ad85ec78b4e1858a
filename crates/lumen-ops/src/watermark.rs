//! Watermark configuration and layout.
//!
//! Two styles: a footer band appended below the photo (brand text on the
//! left, date and place on the right, a thin separator between), or a
//! single line of text drawn over the bottom of the photo. This module
//! owns the geometry, the text content and the footer band itself; glyph
//! rasterisation belongs to whoever draws the text.
//!
//! Configuration is read from YAML:
//!
//! ```yaml
//! style-footer: true
//! background-color: "#FFFFFF"
//! text-color: "#000000"
//! custom-text: "LUMEN"
//! place-name: "Lisbon"
//! text-size: large
//! position: right
//! ```

use chrono::NaiveDateTime;
use lumen_core::{ArgbImage, pixel};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::OpsResult;

/// Text used when the custom text is hidden.
pub const BRAND_TEXT: &str = "LUMEN";

/// Footer band height as a fraction of the longer image side.
pub const FOOTER_RATIO: f32 = 0.12;

/// Separator color (light grey).
pub const SEPARATOR_COLOR: u32 = 0xFFCC_CCCC;

/// Overlay text size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextSize {
    /// 0.8x
    Small,
    /// 1.0x
    #[default]
    Medium,
    /// 1.4x
    Large,
}

impl TextSize {
    /// Multiplier on the base overlay size.
    pub fn scale(self) -> f32 {
        match self {
            TextSize::Small => 0.8,
            TextSize::Medium => 1.0,
            TextSize::Large => 1.4,
        }
    }
}

/// Overlay text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Left edge plus padding.
    #[default]
    Left,
    /// Horizontally centred.
    Center,
    /// Right edge minus padding.
    Right,
}

/// Watermark settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WatermarkConfig {
    /// Master switch.
    pub enabled: bool,
    /// Footer band when `true`, overlay text otherwise.
    pub style_footer: bool,
    /// Footer background, `0xAARRGGBB`.
    #[serde(deserialize_with = "color")]
    pub background_color: u32,
    /// Text color, `0xAARRGGBB`.
    #[serde(deserialize_with = "color")]
    pub text_color: u32,
    /// Show [`Self::custom_text`] (footer falls back to [`BRAND_TEXT`]).
    pub show_logo: bool,
    /// Brand or signature text.
    pub custom_text: String,
    /// Show the capture date.
    pub show_time: bool,
    /// Show [`Self::place_name`] in the footer.
    pub show_place: bool,
    /// Place label, empty when unknown.
    pub place_name: String,
    /// Overlay text size class.
    pub text_size: TextSize,
    /// Overlay anchor.
    pub position: Position,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style_footer: true,
            background_color: pixel::WHITE,
            text_color: pixel::BLACK,
            show_logo: true,
            custom_text: BRAND_TEXT.to_string(),
            show_time: true,
            show_place: true,
            place_name: String::new(),
            text_size: TextSize::default(),
            position: Position::default(),
        }
    }
}

fn color<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    pixel::parse_hex(raw.trim()).ok_or_else(|| de::Error::custom(format!("invalid color '{raw}'")))
}

impl WatermarkConfig {
    /// Left-hand footer text.
    pub fn footer_text(&self) -> &str {
        if self.show_logo { &self.custom_text } else { BRAND_TEXT }
    }

    /// Right-hand footer text: `yyyy.MM.dd HH:mm`, then `" | place"`.
    pub fn meta_text(&self, at: &NaiveDateTime) -> String {
        let mut meta = String::new();
        if self.show_time {
            meta.push_str(&at.format("%Y.%m.%d %H:%M").to_string());
        }
        if self.show_place && !self.place_name.is_empty() {
            if !meta.is_empty() {
                meta.push_str(" | ");
            }
            meta.push_str(&self.place_name);
        }
        meta
    }

    /// Overlay line: custom text, then two spaces and `MM.dd`.
    pub fn overlay_text(&self, at: &NaiveDateTime) -> String {
        let mut text = String::new();
        if self.show_logo {
            text.push_str(&self.custom_text);
        }
        if self.show_time {
            text.push_str("  ");
            text.push_str(&at.format("%m.%d").to_string());
        }
        text
    }
}

/// Geometry for one image size. All lengths in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkLayout {
    /// Footer band height, `floor(max(w, h) * 0.12)`.
    pub footer_height: u32,
    /// Footer brand text size.
    pub primary_font: f32,
    /// Footer metadata text size.
    pub meta_font: f32,
    /// Horizontal inset, `0.05 * width`.
    pub padding: f32,
    /// Footer text baseline.
    pub footer_baseline: f32,
    /// Separator line top.
    pub separator_top: f32,
    /// Separator line bottom.
    pub separator_bottom: f32,
    /// Overlay text size.
    pub overlay_font: f32,
    /// Overlay text baseline, `height - padding`.
    pub overlay_baseline: f32,
    width: f32,
    position: Position,
}

impl WatermarkLayout {
    /// Layout for a `width` x `height` photo.
    pub fn compute(width: u32, height: u32, config: &WatermarkConfig) -> Self {
        let (w, h) = (width as f32, height as f32);
        let footer_height = (w.max(h) * FOOTER_RATIO) as u32;
        let footer = footer_height as f32;
        let primary_font = footer * 0.28;
        let padding = w * 0.05;
        Self {
            footer_height,
            primary_font,
            meta_font: footer * 0.22,
            padding,
            footer_baseline: h + footer / 2.0 + primary_font / 3.0,
            separator_top: h + footer * 0.3,
            separator_bottom: h + footer * 0.7,
            overlay_font: w.min(h) * 0.035 * config.text_size.scale(),
            overlay_baseline: h - padding,
            width: w,
            position: config.position,
        }
    }

    /// Left edge of overlay text `text_width` wide.
    pub fn overlay_x(&self, text_width: f32) -> f32 {
        match self.position {
            Position::Left => self.padding,
            Position::Center => (self.width - text_width) / 2.0,
            Position::Right => self.width - self.padding - text_width,
        }
    }

    /// Separator x, left of right-aligned metadata `meta_width` wide.
    pub fn separator_x(&self, meta_width: f32) -> f32 {
        self.width - self.padding - meta_width - self.padding / 2.0
    }
}

/// Copies `src` onto a taller canvas with a footer band in the
/// configured background color.
pub fn extend_with_footer(src: &ArgbImage, config: &WatermarkConfig) -> OpsResult<ArgbImage> {
    let (width, height) = src.dimensions();
    let layout = WatermarkLayout::compute(width, height, config);
    let mut out = ArgbImage::filled(width, height + layout.footer_height, config.background_color)?;
    let len = src.pixels().len();
    out.pixels_mut()[..len].copy_from_slice(src.pixels());
    Ok(out)
}
