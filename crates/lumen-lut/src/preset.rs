//! Named curve presets and the in-memory preset library.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::LutResult;
use crate::model::Channel;
use crate::spline::Spline;
use crate::xmp;

/// Name given to presets that do not carry one.
pub const DEFAULT_PRESET_NAME: &str = "New Preset";

/// Name of the built-in preset that restores the default curves.
pub const RESET_PRESET_NAME: &str = "Reset";

/// Snapshot of four curves, a saturation and a display name.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePreset {
    /// Display name.
    pub name: String,
    /// Composite curve.
    pub rgb: Spline,
    /// Red curve.
    pub red: Spline,
    /// Green curve.
    pub green: Spline,
    /// Blue curve.
    pub blue: Spline,
    /// Saturation in `[-100, 100]`.
    pub saturation: i32,
}

impl Default for CurvePreset {
    fn default() -> Self {
        Self::new(DEFAULT_PRESET_NAME)
    }
}

impl CurvePreset {
    /// Default curves and zero saturation under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rgb: Spline::default(),
            red: Spline::default(),
            green: Spline::default(),
            blue: Spline::default(),
            saturation: 0,
        }
    }

    /// Curve for `channel`.
    pub fn spline(&self, channel: Channel) -> &Spline {
        match channel {
            Channel::Rgb => &self.rgb,
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Replaces one curve, builder style.
    pub fn with_spline(mut self, channel: Channel, spline: Spline) -> Self {
        match channel {
            Channel::Rgb => self.rgb = spline,
            Channel::Red => self.red = spline,
            Channel::Green => self.green = spline,
            Channel::Blue => self.blue = spline,
        }
        self
    }

    /// Sets saturation, clamped to `[-100, 100]`, builder style.
    pub fn with_saturation(mut self, saturation: i32) -> Self {
        self.saturation = saturation.clamp(crate::model::MIN_SATURATION, crate::model::MAX_SATURATION);
        self
    }
}

/// Ordered list of shared, immutable presets.
///
/// Entries are handed out as `Arc<CurvePreset>` and never change after
/// insertion; "editing" a preset means adding a new one.
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    presets: Vec<Arc<CurvePreset>>,
}

impl PresetLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Library seeded with a [`RESET_PRESET_NAME`] entry holding default curves.
    pub fn with_reset() -> Self {
        let mut lib = Self::new();
        lib.add(CurvePreset::new(RESET_PRESET_NAME));
        lib
    }

    /// Appends a preset and returns the shared handle.
    pub fn add(&mut self, preset: CurvePreset) -> Arc<CurvePreset> {
        let preset = Arc::new(preset);
        self.presets.push(Arc::clone(&preset));
        preset
    }

    /// Decodes an XMP file and appends it.
    pub fn import(&mut self, path: &Path) -> LutResult<Arc<CurvePreset>> {
        let preset = xmp::read_xmp(path)?;
        debug!(name = %preset.name, path = %path.display(), "imported preset");
        Ok(self.add(preset))
    }

    /// Preset at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<CurvePreset>> {
        self.presets.get(index).cloned()
    }

    /// First preset named `name`.
    pub fn find(&self, name: &str) -> Option<Arc<CurvePreset>> {
        self.presets.iter().find(|p| p.name == name).cloned()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CurvePreset>> {
        self.presets.iter()
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// `true` when no preset was added.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::ControlPoint;

    #[test]
    fn default_name() {
        let p = CurvePreset::default();
        assert_eq!(p.name, "New Preset");
        assert_eq!(p.saturation, 0);
        assert!(Channel::ALL.iter().all(|&c| p.spline(c).is_default()));
    }

    #[test]
    fn builders() {
        let s = Spline::from_points([ControlPoint::new(0.0, 0.9), ControlPoint::new(1.0, 0.1)]);
        let p = CurvePreset::new("x").with_spline(Channel::Green, s.clone()).with_saturation(-400);
        assert_eq!(p.green, s);
        assert_eq!(p.saturation, -100);
    }

    #[test]
    fn library_shares_entries() {
        let mut lib = PresetLibrary::with_reset();
        let added = lib.add(CurvePreset::new("Warm").with_saturation(20));
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get(0).map(|p| p.name.clone()), Some("Reset".to_string()));
        let found = lib.find("Warm").unwrap();
        assert!(Arc::ptr_eq(&found, &added));
        assert!(lib.find("Cold").is_none());
    }
}
