//! Offline chaos render to 16-bit PCM.
//!
//! Runs the same [`ChaosScheduler`] as the live runner, but on a sample
//! clock: the source loops while Playing, the output is silent while
//! suspended, and volume moves in per-sample linear ramps instead of
//! stepped fades. The source only advances while audible, so every
//! Playing phase picks up where the last one left off.
//!
//! Includes a minimal RIFF/WAVE reader and writer for 16-bit PCM.

use std::io::{Read, Write};

use rand::Rng;
use tracing::debug;

use crate::config::ChaosConfig;
use crate::error::{ChaosError, ChaosResult};
use crate::scheduler::{ChaosScheduler, Effect, Event};
use crate::timeline::TimerQueue;
use crate::volume::perceptual_gain;

/// Render length when the session is unbounded.
pub const DEFAULT_RENDER_MINS: u64 = 10;

/// WAV header size.
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Output format of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channels per frame.
    pub channels: u16,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

impl RenderSettings {
    /// Frame index at `ms`.
    pub fn frames_at(&self, ms: u64) -> u64 {
        ms * u64::from(self.sample_rate) / 1000
    }

    /// Bytes per second of 16-bit output.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.channels) * u32::from(BITS_PER_SAMPLE / 8)
    }

    fn block_align(&self) -> u16 {
        self.channels * (BITS_PER_SAMPLE / 8)
    }
}

#[derive(Debug, Clone, Copy)]
struct Ramp {
    from: f32,
    to: f32,
    start: u64,
    frames: u64,
    suspend_after: bool,
}

/// Playback state on the sample clock.
struct Voice<'a> {
    source: &'a [i16],
    cursor: usize,
    frame: u64,
    audible: bool,
    level: f32,
    ramp: Option<Ramp>,
}

impl<'a> Voice<'a> {
    fn new(source: &'a [i16]) -> Self {
        Self {
            source,
            cursor: 0,
            frame: 0,
            audible: false,
            level: 0.0,
            ramp: None,
        }
    }

    fn apply(&mut self, effects: &[Effect], now_ms: u64, settings: &RenderSettings, queue: &mut TimerQueue) {
        for effect in effects {
            match *effect {
                Effect::ResumeOutput => self.audible = true,
                Effect::SuspendOutput => self.audible = false,
                Effect::SetLevel(level) => {
                    self.level = level;
                    self.ramp = None;
                }
                // Ramps start from wherever the voice is, so an interrupted
                // drift never jumps.
                Effect::Fade { fade, suspend_after } => {
                    self.ramp = Some(Ramp {
                        from: self.level,
                        to: fade.to,
                        start: self.frame,
                        frames: settings.frames_at(fade.duration_ms).max(1),
                        suspend_after,
                    });
                }
                Effect::CancelFade => self.ramp = None,
                Effect::SetTimer { id, after_ms } => queue.push(now_ms + after_ms, id),
                Effect::CancelTimer(_) | Effect::PhaseChanged(_) => {}
            }
        }
    }

    fn advance_level(&mut self) -> f32 {
        if let Some(ramp) = self.ramp {
            let t = (self.frame - ramp.start) as f32 / ramp.frames as f32;
            if t >= 1.0 {
                self.level = ramp.to;
                self.ramp = None;
                if ramp.suspend_after {
                    self.audible = false;
                }
            } else {
                self.level = ramp.from + (ramp.to - ramp.from) * t;
            }
        }
        self.level
    }

    fn fill(&mut self, out: &mut Vec<i16>, until: u64, channels: usize) {
        while self.frame < until {
            let gain = perceptual_gain(self.advance_level());
            for _ in 0..channels {
                let sample = if self.audible && !self.source.is_empty() {
                    let s = self.source[self.cursor];
                    self.cursor = (self.cursor + 1) % self.source.len();
                    (f32::from(s) * gain) as i16
                } else {
                    0
                };
                out.push(sample);
            }
            self.frame += 1;
        }
    }
}

/// Renders a chaos session over an interleaved `source` loop.
///
/// Output length is the session length, or [`DEFAULT_RENDER_MINS`] when
/// the session is unbounded. An empty source renders silence.
pub fn render<R: Rng + ?Sized>(
    source: &[i16],
    config: &ChaosConfig,
    settings: &RenderSettings,
    rng: &mut R,
) -> Vec<i16> {
    let channels = usize::from(settings.channels.max(1));
    let total_ms = config.session_ms().unwrap_or(DEFAULT_RENDER_MINS * 60_000);
    let total_frames = settings.frames_at(total_ms);
    debug!(total_ms, total_frames, channels, "chaos render");

    let mut out = Vec::with_capacity(total_frames as usize * channels);
    let mut scheduler = ChaosScheduler::new(config);
    let mut queue = TimerQueue::default();
    let mut voice = Voice::new(source);

    let effects = scheduler.handle(Event::Start, 0, rng);
    voice.apply(&effects, 0, settings, &mut queue);

    while voice.frame < total_frames {
        let until = queue
            .peek_due()
            .map_or(total_frames, |ms| settings.frames_at(ms).min(total_frames));
        voice.fill(&mut out, until, channels);
        let Some((due, id)) = queue.pop() else {
            break;
        };
        if voice.frame >= total_frames {
            break;
        }
        let effects = scheduler.handle(Event::Timer(id), due, rng);
        voice.apply(&effects, due, settings, &mut queue);
    }
    out
}

/// Writes `samples` as a 16-bit PCM WAV stream.
pub fn write_wav<W: Write>(mut writer: W, samples: &[i16], settings: &RenderSettings) -> ChaosResult<()> {
    let data_len = u32::try_from(samples.len() * 2)
        .ok()
        .filter(|len| *len <= u32::MAX - 36)
        .ok_or_else(|| ChaosError::Audio(format!("{} samples exceed the WAV size limit", samples.len())))?;

    let mut header = Vec::with_capacity(WAV_HEADER_LEN);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&(data_len + 36).to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    header.extend_from_slice(&settings.channels.to_le_bytes());
    header.extend_from_slice(&settings.sample_rate.to_le_bytes());
    header.extend_from_slice(&settings.byte_rate().to_le_bytes());
    header.extend_from_slice(&settings.block_align().to_le_bytes());
    header.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header.extend_from_slice(b"data");
    header.extend_from_slice(&data_len.to_le_bytes());
    writer.write_all(&header)?;

    let body: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

/// Reads a 16-bit PCM WAV stream. Unknown chunks are skipped.
pub fn read_wav<R: Read>(mut reader: R) -> ChaosResult<(RenderSettings, Vec<i16>)> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(ChaosError::Audio("not a RIFF/WAVE stream".into()));
    }

    let mut settings = None;
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32_at(&bytes, pos + 4) as usize;
        let body_start = pos + 8;
        let body_end = body_start.saturating_add(size).min(bytes.len());
        let body = &bytes[body_start..body_end];
        match id {
            b"fmt " => {
                if body.len() < 16 {
                    return Err(ChaosError::Audio("truncated fmt chunk".into()));
                }
                let format = u16_at(body, 0);
                let bits = u16_at(body, 14);
                if format != PCM_FORMAT || bits != BITS_PER_SAMPLE {
                    return Err(ChaosError::Audio(format!("format {format} with {bits} bits, need 16-bit PCM")));
                }
                settings = Some(RenderSettings {
                    channels: u16_at(body, 2),
                    sample_rate: u32_at(body, 4),
                });
            }
            b"data" => {
                let settings = settings.ok_or_else(|| ChaosError::Audio("data before fmt chunk".into()))?;
                let samples = body
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect();
                return Ok((settings, samples));
            }
            _ => {}
        }
        // Chunks are padded to even length.
        pos = body_start.saturating_add(size + (size & 1));
    }
    Err(ChaosError::Audio("no data chunk".into()))
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
