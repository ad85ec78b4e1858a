//! # lumen-chaos
//!
//! Chaos sleep-audio scheduler: a session alternates between audible
//! Playing phases and Silent phases of random length, while the volume
//! drifts between two bounds on a randomized cadence.
//!
//! The state machine in [`scheduler`] has no clock. It is driven by
//! virtual time in [`timeline`] and [`render`], and by wall time in
//! [`runner`].
//!
//! # Modules
//!
//! - [`config`] - [`ChaosConfig`] and [`DurationSpec`], YAML loading
//! - [`volume`] - perceptual gain, [`Fade`], [`DriftPlanner`]
//! - [`scheduler`] - [`ChaosScheduler`] with explicit events and effects
//! - [`timeline`] - instant simulation of a whole session
//! - [`runner`] - real-time driver on a worker thread
//! - [`render`] - offline PCM render and WAV I/O
//!
//! # Example
//!
//! ```rust
//! use lumen_chaos::{ChaosConfig, DurationSpec, Phase, timeline};
//! use rand::SeedableRng;
//!
//! let config = ChaosConfig {
//!     duration_mins: 1,
//!     play: DurationSpec::Range { min_secs: 10, max_secs: 10 },
//!     pause: DurationSpec::Range { min_secs: 5, max_secs: 5 },
//!     ..ChaosConfig::default()
//! };
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let tl = timeline::simulate(&config, u64::MAX, &mut rng);
//! assert_eq!(tl.final_phase(), Phase::Stopped);
//! ```
//!
//! # Used By
//!
//! - `lumen-cli` - `chaos` command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod config;
pub mod render;
pub mod runner;
pub mod scheduler;
pub mod timeline;
pub mod volume;

pub use config::{ChaosConfig, DurationSpec};
pub use error::{ChaosError, ChaosResult};
pub use render::{RenderSettings, read_wav, render, write_wav};
pub use runner::{AudioSink, ChaosHandle, ChaosRunner};
pub use scheduler::{ChaosScheduler, Effect, Event, Phase, TimerId, TimerKind};
pub use timeline::{Timeline, simulate};
pub use volume::{DriftPlanner, Fade, perceptual_gain};
