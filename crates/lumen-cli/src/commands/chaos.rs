//! Chaos session commands

use anyhow::{Context, Result, bail};
use lumen_chaos::{AudioSink, ChaosRunner, Timeline, read_wav, write_wav};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

pub fn simulate(config: Option<&Path>, seed: Option<u64>, horizon_mins: u64) -> Result<()> {
    let config = super::load_chaos_config(config)?;
    let mut rng = seeded(seed);
    let timeline = lumen_chaos::simulate(&config, horizon_mins.saturating_mul(60_000), &mut rng);
    print!("{}", format_timeline(&timeline));
    Ok(())
}

pub fn run(config: Option<&Path>) -> Result<()> {
    let config = super::load_chaos_config(config)?;
    let handle = ChaosRunner::spawn(&config, LogSink::default()).context("Failed to start chaos runner")?;
    handle.join().context("Chaos runner failed")?;
    Ok(())
}

pub fn render(config: Option<&Path>, source: &Path, output: &Path, seed: Option<u64>) -> Result<()> {
    let config = super::load_chaos_config(config)?;
    let file = File::open(source).with_context(|| format!("Failed to open: {}", source.display()))?;
    let (settings, samples) =
        read_wav(BufReader::new(file)).with_context(|| format!("Failed to read WAV: {}", source.display()))?;
    if samples.is_empty() {
        bail!("{} has no audio", source.display());
    }
    info!(
        sample_rate = settings.sample_rate,
        channels = settings.channels,
        samples = samples.len(),
        "source loaded"
    );

    let mut rng = seeded(seed);
    let mixed = lumen_chaos::render(&samples, &config, &settings, &mut rng);

    let file = File::create(output).with_context(|| format!("Failed to create: {}", output.display()))?;
    write_wav(BufWriter::new(file), &mixed, &settings)
        .with_context(|| format!("Failed to write WAV: {}", output.display()))?;
    info!(path = %output.display(), samples = mixed.len(), "render written");
    Ok(())
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::rng().random()),
    }
}

fn format_timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    for (phase, start, end) in timeline.segments() {
        let drifts = timeline
            .drifts
            .iter()
            .filter(|d| d.at_ms >= start && d.at_ms < end)
            .count();
        out.push_str(&format!("{}  {:<8}", super::format_ms(start), phase.as_str()));
        if end > start {
            out.push_str(&format!(" {:>6.1}s", (end - start) as f64 / 1000.0));
        }
        if drifts > 0 {
            out.push_str(&format!("  ({drifts} drift)"));
        }
        out.push('\n');
    }
    out
}

/// Sink that only logs what it would do.
#[derive(Default)]
struct LogSink {
    gain: f32,
}

impl AudioSink for LogSink {
    fn resume(&mut self) {
        info!("output resumed");
    }

    fn suspend(&mut self) {
        info!(gain = self.gain, "output suspended");
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
        tracing::trace!(gain, "gain");
    }
}
