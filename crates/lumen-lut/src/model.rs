//! Editable curve state: four splines plus saturation.

use std::fmt;

use crate::lut::Lut256;
use crate::preset::CurvePreset;
use crate::spline::{ControlPoint, Spline};

/// Lowest accepted saturation.
pub const MIN_SATURATION: i32 = -100;

/// Highest accepted saturation.
pub const MAX_SATURATION: i32 = 100;

/// Curve channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    /// Composite curve applied to all three channels.
    #[default]
    Rgb,
    /// Red only.
    Red,
    /// Green only.
    Green,
    /// Blue only.
    Blue,
}

impl Channel {
    /// All channels in application order: composite first.
    pub const ALL: [Channel; 4] = [Channel::Rgb, Channel::Red, Channel::Green, Channel::Blue];

    /// Position in [`Channel::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Rgb => 0,
            Channel::Red => 1,
            Channel::Green => 2,
            Channel::Blue => 3,
        }
    }

    /// Lower-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Channel::Rgb => "rgb",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }

    /// Parses a channel name (case-insensitive, `r`/`g`/`b` accepted).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" | "composite" | "all" => Some(Channel::Rgb),
            "red" | "r" => Some(Channel::Red),
            "green" | "g" => Some(Channel::Green),
            "blue" | "b" => Some(Channel::Blue),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four splines keyed by [`Channel`] and an integer saturation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveModel {
    splines: [Spline; 4],
    saturation: i32,
}

impl CurveModel {
    /// Default splines on every channel, zero saturation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every curve and the saturation from a preset.
    pub fn from_preset(preset: &CurvePreset) -> Self {
        let mut model = Self::new();
        model.apply_preset(preset);
        model
    }

    /// Spline for `channel`.
    #[inline]
    pub fn spline(&self, channel: Channel) -> &Spline {
        &self.splines[channel.index()]
    }

    /// Mutable spline for `channel`.
    #[inline]
    pub fn spline_mut(&mut self, channel: Channel) -> &mut Spline {
        &mut self.splines[channel.index()]
    }

    /// Replaces a channel's points; fewer than two falls back to the default.
    pub fn set_points(&mut self, channel: Channel, points: impl IntoIterator<Item = ControlPoint>) {
        self.splines[channel.index()] = Spline::from_points(points);
    }

    /// Saturation in `[-100, 100]`.
    #[inline]
    pub fn saturation(&self) -> i32 {
        self.saturation
    }

    /// Sets saturation, clamped to `[-100, 100]`.
    pub fn set_saturation(&mut self, saturation: i32) {
        self.saturation = saturation.clamp(MIN_SATURATION, MAX_SATURATION);
    }

    /// LUT of one channel.
    pub fn lut(&self, channel: Channel) -> Lut256 {
        self.spline(channel).lut()
    }

    /// LUTs of every channel, in [`Channel::ALL`] order.
    pub fn luts(&self) -> [Lut256; 4] {
        Channel::ALL.map(|c| self.lut(c))
    }

    /// Resets every spline and the saturation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Copies curves and saturation from `preset`.
    pub fn apply_preset(&mut self, preset: &CurvePreset) {
        for channel in Channel::ALL {
            self.splines[channel.index()] = preset.spline(channel).clone();
        }
        self.set_saturation(preset.saturation);
    }

    /// Snapshots the current state as a named preset.
    pub fn to_preset(&self, name: impl Into<String>) -> CurvePreset {
        CurvePreset {
            name: name.into(),
            rgb: self.spline(Channel::Rgb).clone(),
            red: self.spline(Channel::Red).clone(),
            green: self.spline(Channel::Green).clone(),
            blue: self.spline(Channel::Blue).clone(),
            saturation: self.saturation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_clamped() {
        let mut m = CurveModel::new();
        m.set_saturation(250);
        assert_eq!(m.saturation(), 100);
        m.set_saturation(-101);
        assert_eq!(m.saturation(), -100);
        m.set_saturation(-30);
        assert_eq!(m.saturation(), -30);
    }

    #[test]
    fn channels_are_independent() {
        let mut m = CurveModel::new();
        m.spline_mut(Channel::Red).insert(0.5, 0.2);
        assert_eq!(m.spline(Channel::Red).len(), 3);
        for c in [Channel::Rgb, Channel::Green, Channel::Blue] {
            assert!(m.spline(c).is_default());
        }
        assert!(m.lut(Channel::Red).is_active());
        assert!(!m.lut(Channel::Green).is_active());
    }

    #[test]
    fn short_point_list_defaults() {
        let mut m = CurveModel::new();
        m.set_points(Channel::Blue, [ControlPoint::new(0.5, 0.5)]);
        assert!(m.spline(Channel::Blue).is_default());
    }

    #[test]
    fn preset_round_trip() {
        let mut m = CurveModel::new();
        m.spline_mut(Channel::Green).insert(0.4, 0.3);
        m.set_saturation(42);
        let p = m.to_preset("Greenish");
        assert_eq!(p.name, "Greenish");
        assert_eq!(CurveModel::from_preset(&p), m);
    }

    #[test]
    fn reset_restores_default() {
        let mut m = CurveModel::new();
        m.spline_mut(Channel::Rgb).insert(0.5, 0.1);
        m.set_saturation(10);
        m.reset();
        assert_eq!(m, CurveModel::default());
    }

    #[test]
    fn channel_names() {
        assert_eq!(Channel::parse("R"), Some(Channel::Red));
        assert_eq!(Channel::parse("composite"), Some(Channel::Rgb));
        assert_eq!(Channel::parse("alpha"), None);
        assert_eq!(Channel::Blue.to_string(), "blue");
    }
}
