//! Touch-gesture model of the curve editor.
//!
//! Coordinates are normalized canvas positions; anything outside `[0, 1]`
//! is clamped before use, so callers can pass raw `touch / size` values.
//!
//! ```rust
//! use lumen_lut::{Channel, CurveEditor};
//!
//! let mut ed = CurveEditor::new();
//! ed.set_channel(Channel::Red);
//! let idx = ed.press(0.5, 0.3).unwrap();
//! ed.drag(0.55, 0.25);
//! ed.release();
//! assert_eq!(ed.model().spline(Channel::Red).len(), 3);
//! assert_eq!(idx, 1);
//! ```

use crate::model::{Channel, CurveModel};

/// Gesture state over a [`CurveModel`].
#[derive(Debug, Clone, Default)]
pub struct CurveEditor {
    model: CurveModel,
    channel: Channel,
    active: Option<usize>,
    revision: u64,
}

impl CurveEditor {
    /// Editor over a default model, composite channel selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor over an existing model.
    pub fn with_model(model: CurveModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Selects the channel subsequent gestures edit. Drops any selection.
    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
        self.active = None;
    }

    /// Channel being edited.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Edited model.
    pub fn model(&self) -> &CurveModel {
        &self.model
    }

    /// Mutable model, for saturation and preset loads.
    pub fn model_mut(&mut self) -> &mut CurveModel {
        self.revision += 1;
        &mut self.model
    }

    /// Consumes the editor.
    pub fn into_model(self) -> CurveModel {
        self.model
    }

    /// Selected point index.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Bumped on every change to the model; lets callers rebuild LUTs lazily.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Touch down: selects the nearest point within hit radius, otherwise
    /// inserts a new one. Returns the selected index, or `None` when the
    /// spline is full.
    pub fn press(&mut self, x: f32, y: f32) -> Option<usize> {
        let (x, y) = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
        let spline = self.model.spline_mut(self.channel);
        self.active = match spline.hit_test(x, y) {
            Some(i) => Some(i),
            None => {
                let inserted = spline.insert(x, y);
                if inserted.is_some() {
                    self.revision += 1;
                }
                inserted
            }
        };
        self.active
    }

    /// Touch move: drags the selected point. Returns `false` with no selection.
    pub fn drag(&mut self, x: f32, y: f32) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        let moved = self.model.spline_mut(self.channel).move_point(index, x, y);
        if moved {
            self.revision += 1;
        }
        moved
    }

    /// Touch up.
    pub fn release(&mut self) {
        self.active = None;
    }

    /// Resets every channel to the default curve. Saturation is kept.
    pub fn reset_all(&mut self) {
        for channel in Channel::ALL {
            self.model.spline_mut(channel).reset();
        }
        self.active = None;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_selects_existing_point() {
        let mut ed = CurveEditor::new();
        assert_eq!(ed.press(0.02, 0.97), Some(0));
        assert_eq!(ed.model().spline(Channel::Rgb).len(), 2);
        assert_eq!(ed.revision(), 0);
    }

    #[test]
    fn press_outside_inserts() {
        let mut ed = CurveEditor::new();
        assert_eq!(ed.press(0.5, 0.2), Some(1));
        assert_eq!(ed.model().spline(Channel::Rgb).len(), 3);
        assert_eq!(ed.revision(), 1);
    }

    #[test]
    fn press_clamps_coordinates() {
        let mut ed = CurveEditor::new();
        // (-3, 5) clamps to (0, 1), which hits the first point.
        assert_eq!(ed.press(-3.0, 5.0), Some(0));
    }

    #[test]
    fn drag_needs_selection() {
        let mut ed = CurveEditor::new();
        assert!(!ed.drag(0.5, 0.5));
        ed.press(0.5, 0.5);
        assert!(ed.drag(0.6, 0.4));
        let p = ed.model().spline(Channel::Rgb).points()[1];
        assert_eq!((p.x, p.y), (0.6, 0.4));
        ed.release();
        assert!(!ed.drag(0.1, 0.1));
    }

    #[test]
    fn full_spline_rejects_press() {
        let mut ed = CurveEditor::new();
        for i in 1..=8 {
            ed.press(i as f32 / 9.0, 0.0);
            ed.release();
        }
        assert_eq!(ed.model().spline(Channel::Rgb).len(), 10);
        assert_eq!(ed.press(0.5, 0.9), None);
    }

    #[test]
    fn channel_switch_and_reset() {
        let mut ed = CurveEditor::new();
        ed.set_channel(Channel::Blue);
        ed.press(0.5, 0.1);
        assert_eq!(ed.active(), Some(1));
        ed.set_channel(Channel::Green);
        assert_eq!(ed.active(), None);
        ed.model_mut().set_saturation(30);
        ed.reset_all();
        assert!(ed.model().spline(Channel::Blue).is_default());
        assert_eq!(ed.model().saturation(), 30);
    }
}
