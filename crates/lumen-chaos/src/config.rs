//! Session configuration.
//!
//! Read from YAML; every field is optional:
//!
//! ```yaml
//! duration-mins: 45
//! play:
//!   range: { min-secs: 20, max-secs: 90 }
//! pause:
//!   level: 3
//! min-volume: 0.25
//! max-volume: 0.7
//! volume-frequency: 6
//! ```
//!
//! Out-of-order ranges are swapped and out-of-range values clamped by
//! [`ChaosConfig::normalized`]; nothing here is rejected.

use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::error::ChaosResult;

/// Lowest and highest duration level / drift frequency.
pub const LEVEL_RANGE: (u32, u32) = (1, 10);

/// How long a phase lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum DurationSpec {
    /// Uniform whole seconds in `[min_secs, max_secs]`.
    Range {
        /// Shortest phase.
        min_secs: u32,
        /// Longest phase.
        max_secs: u32,
    },
    /// Level 1..=10, mapped to `[5 * level, 15 * level]` seconds.
    Level(u32),
}

impl DurationSpec {
    /// Bounds in seconds, as configured (not normalized).
    pub fn bounds_secs(&self) -> (u32, u32) {
        match *self {
            DurationSpec::Range { min_secs, max_secs } => (min_secs, max_secs),
            DurationSpec::Level(level) => (level.saturating_mul(5), level.saturating_mul(15)),
        }
    }

    /// Swaps an inverted range and clamps a level.
    pub fn normalized(self) -> Self {
        match self {
            DurationSpec::Range { min_secs, max_secs } if min_secs > max_secs => DurationSpec::Range {
                min_secs: max_secs,
                max_secs: min_secs,
            },
            DurationSpec::Level(level) => DurationSpec::Level(level.clamp(LEVEL_RANGE.0, LEVEL_RANGE.1)),
            other => other,
        }
    }

    /// Draws a duration in milliseconds. A degenerate range yields its
    /// minimum.
    pub fn sample_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let (min, max) = self.bounds_secs();
        let secs = if min >= max { min } else { rng.random_range(min..=max) };
        u64::from(secs) * 1000
    }
}

/// Chaos session settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChaosConfig {
    /// Session length in minutes, 0 for unbounded.
    pub duration_mins: u32,
    /// Playing phase length.
    pub play: DurationSpec,
    /// Silent phase length.
    pub pause: DurationSpec,
    /// Lowest drift target, 0..=1.
    pub min_volume: f32,
    /// Highest drift target, 0..=1.
    pub max_volume: f32,
    /// Drift cadence 1..=10, higher is faster.
    pub volume_frequency: u32,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            duration_mins: 30,
            play: DurationSpec::Range {
                min_secs: 10,
                max_secs: 60,
            },
            pause: DurationSpec::Range {
                min_secs: 5,
                max_secs: 20,
            },
            min_volume: 0.2,
            max_volume: 0.8,
            volume_frequency: 5,
        }
    }
}

impl ChaosConfig {
    /// Parses YAML and normalizes the result.
    pub fn from_yaml(text: &str) -> ChaosResult<Self> {
        let raw: Self = serde_yaml::from_str(text)?;
        Ok(raw.normalized())
    }

    /// Reads and parses a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ChaosResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Copy with ranges ordered, volumes clamped to `[0, 1]` and the
    /// frequency clamped to `1..=10`.
    pub fn normalized(&self) -> Self {
        let clamp01 = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let (mut lo, mut hi) = (clamp01(self.min_volume), clamp01(self.max_volume));
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        Self {
            duration_mins: self.duration_mins,
            play: self.play.normalized(),
            pause: self.pause.normalized(),
            min_volume: lo,
            max_volume: hi,
            volume_frequency: self.volume_frequency.clamp(LEVEL_RANGE.0, LEVEL_RANGE.1),
        }
    }

    /// Starting volume: middle of the range.
    pub fn initial_volume(&self) -> f32 {
        self.min_volume + (self.max_volume - self.min_volume) / 2.0
    }

    /// Session length in milliseconds, `None` when unbounded.
    pub fn session_ms(&self) -> Option<u64> {
        (self.duration_mins > 0).then(|| u64::from(self.duration_mins) * 60_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn yaml_forms() {
        let cfg = ChaosConfig::from_yaml(
            "duration-mins: 1\nplay:\n  range: { min-secs: 10, max-secs: 10 }\npause:\n  level: 2\n",
        )
        .unwrap();
        assert_eq!(cfg.duration_mins, 1);
        assert_eq!(cfg.play, DurationSpec::Range { min_secs: 10, max_secs: 10 });
        assert_eq!(cfg.pause.bounds_secs(), (10, 30));
        assert_eq!(cfg.volume_frequency, 5);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ChaosConfig::from_yaml("{}").unwrap(), ChaosConfig::default());
    }

    #[test]
    fn bad_yaml_is_error() {
        assert!(ChaosConfig::from_yaml("play: sometimes").is_err());
    }

    #[test]
    fn normalization_swaps_and_clamps() {
        let cfg = ChaosConfig {
            play: DurationSpec::Range { min_secs: 60, max_secs: 10 },
            pause: DurationSpec::Level(42),
            min_volume: 1.5,
            max_volume: -0.2,
            volume_frequency: 0,
            ..ChaosConfig::default()
        }
        .normalized();
        assert_eq!(cfg.play, DurationSpec::Range { min_secs: 10, max_secs: 60 });
        assert_eq!(cfg.pause, DurationSpec::Level(10));
        assert_eq!((cfg.min_volume, cfg.max_volume), (0.0, 1.0));
        assert_eq!(cfg.volume_frequency, 1);
    }

    #[test]
    fn sampling_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let spec = DurationSpec::Range { min_secs: 3, max_secs: 6 };
        let mut seen = [false; 4];
        for _ in 0..500 {
            let ms = spec.sample_ms(&mut rng);
            assert_eq!(ms % 1000, 0);
            assert!((3000..=6000).contains(&ms));
            seen[(ms / 1000 - 3) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "both ends are reachable");
        let fixed = DurationSpec::Range { min_secs: 9, max_secs: 9 };
        assert_eq!(fixed.sample_ms(&mut rng), 9000);
    }

    #[test]
    fn derived_values() {
        let cfg = ChaosConfig::default();
        assert!((cfg.initial_volume() - 0.5).abs() < 1e-6);
        assert_eq!(cfg.session_ms(), Some(30 * 60_000));
        let endless = ChaosConfig {
            duration_mins: 0,
            ..cfg
        };
        assert_eq!(endless.session_ms(), None);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaos.yaml");
        std::fs::write(&path, "min-volume: 0.9\nmax-volume: 0.1\n").unwrap();
        let cfg = ChaosConfig::load(&path).unwrap();
        assert_eq!((cfg.min_volume, cfg.max_volume), (0.1, 0.9));
        assert!(ChaosConfig::load(dir.path().join("missing.yaml")).is_err());
    }
}
