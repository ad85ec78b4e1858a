//! Perceptual gain, stepped fades and the volume drift planner.

use rand::Rng;

/// Exponent of the perceptual volume curve.
pub const PERCEPTUAL_EXPONENT: f32 = 2.5;

/// Steps per fade.
pub const FADE_STEPS: u32 = 20;

/// Shortest delay between fade steps.
pub const MIN_STEP_MS: u64 = 20;

/// Fade-in length when a Playing phase starts.
pub const FADE_IN_MS: u64 = 1000;

/// Fade-out length when a Silent phase starts.
pub const FADE_OUT_MS: u64 = 2000;

/// Output gain for a linear volume: `v^2.5`, clamped to `[0, 1]`.
#[inline]
pub fn perceptual_gain(volume: f32) -> f32 {
    volume.max(0.0).powf(PERCEPTUAL_EXPONENT).min(1.0)
}

/// Linear volume ramp executed in [`FADE_STEPS`] equal steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    /// Starting level.
    pub from: f32,
    /// Final level.
    pub to: f32,
    /// Nominal length.
    pub duration_ms: u64,
}

impl Fade {
    /// Ramp from `from` to `to` over `duration_ms`.
    pub fn new(from: f32, to: f32, duration_ms: u64) -> Self {
        Self { from, to, duration_ms }
    }

    /// Delay between steps, at least [`MIN_STEP_MS`].
    pub fn step_ms(&self) -> u64 {
        (self.duration_ms / u64::from(FADE_STEPS)).max(MIN_STEP_MS)
    }

    /// Level after step `i` (1-based); step [`FADE_STEPS`] lands on `to`.
    pub fn level_at_step(&self, i: u32) -> f32 {
        let progress = i.min(FADE_STEPS) as f32 / FADE_STEPS as f32;
        self.from + (self.to - self.from) * progress
    }

    /// Offset of step `i` from the fade start. Step 1 is applied
    /// immediately, each later one a step delay after the previous.
    pub fn step_offset_ms(&self, i: u32) -> u64 {
        u64::from(i.saturating_sub(1)) * self.step_ms()
    }

    /// Time until the fade counts as finished (one delay after the last step).
    pub fn total_ms(&self) -> u64 {
        u64::from(FADE_STEPS) * self.step_ms()
    }

    /// `(offset_ms, level)` for every step.
    pub fn steps(&self) -> impl Iterator<Item = (u64, f32)> + '_ {
        (1..=FADE_STEPS).map(move |i| (self.step_offset_ms(i), self.level_at_step(i)))
    }

    /// Level in effect `elapsed_ms` after the start.
    pub fn level_at(&self, elapsed_ms: u64) -> f32 {
        let step = (elapsed_ms / self.step_ms()) as u32 + 1;
        self.level_at_step(step)
    }
}

/// One drift re-target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftStep {
    /// New target volume.
    pub target: f32,
    /// Fade length toward the target.
    pub fade_ms: u64,
    /// Delay until the next re-target.
    pub next_ms: u64,
}

/// Randomized drift cadence for a frequency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftPlanner {
    frequency: u32,
}

impl DriftPlanner {
    /// Planner for frequency 1..=10 (clamped).
    pub fn new(frequency: u32) -> Self {
        Self {
            frequency: frequency.clamp(1, 10),
        }
    }

    /// `max(2000, 30000 - (frequency - 1) * 3000)` ms.
    pub fn base_ms(&self) -> u64 {
        let base = 30_000i64 - i64::from(self.frequency - 1) * 3000;
        base.max(2000) as u64
    }

    /// Half the base delay.
    pub fn variance_ms(&self) -> u64 {
        self.base_ms() / 2
    }

    /// Picks a target in `[min, max)` and the fade/next delays:
    /// `fade = base/2 + U[0, variance)`, `next = fade + base/2 + U[0, variance)`.
    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R, min: f32, max: f32) -> DriftStep {
        let target = min + rng.random::<f32>() * (max - min);
        let half = self.base_ms() / 2;
        let variance = self.variance_ms();
        let fade_ms = half + rng.random_range(0..variance);
        let next_ms = fade_ms + half + rng.random_range(0..variance);
        DriftStep { target, fade_ms, next_ms }
    }
}
