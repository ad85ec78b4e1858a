//! Preset inspection and authoring

use anyhow::{Context, Result, bail};
use lumen_lut::{Channel, CurveModel, CurvePreset};
use std::path::Path;
use tracing::info;

pub fn show(path: &Path) -> Result<()> {
    let preset = super::load_preset(path)?;
    println!("{}", describe(&preset));
    Ok(())
}

pub fn create(output: &Path, name: String, saturation: i32, points: &[String]) -> Result<()> {
    let preset = build(name, saturation, points)?;
    lumen_lut::write_xmp(output, &preset).with_context(|| format!("Failed to write preset: {}", output.display()))?;
    info!(path = %output.display(), name = %preset.name, "preset written");
    Ok(())
}

fn build(name: String, saturation: i32, points: &[String]) -> Result<CurvePreset> {
    let mut model = CurveModel::new();
    model.set_saturation(saturation);
    for spec in points {
        let (channel, x, y) = parse_point(spec)?;
        // Curve space has output growing upward; splines store canvas y.
        if model.spline_mut(channel).insert(x, 1.0 - y).is_none() {
            bail!("No room for point '{}' on the {} curve", spec, channel);
        }
    }
    Ok(model.to_preset(name))
}

/// Parses `CHANNEL:X,Y` with both coordinates in `[0, 1]`.
fn parse_point(spec: &str) -> Result<(Channel, f32, f32)> {
    let (channel, coords) = spec
        .split_once(':')
        .with_context(|| format!("Point '{}' is not CHANNEL:X,Y", spec))?;
    let (x, y) = coords
        .split_once(',')
        .with_context(|| format!("Point '{}' is not CHANNEL:X,Y", spec))?;
    let channel = super::parse_channel(channel.trim())?;
    let x: f32 = x.trim().parse().with_context(|| format!("Bad x in '{}'", spec))?;
    let y: f32 = y.trim().parse().with_context(|| format!("Bad y in '{}'", spec))?;
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        bail!("Point '{}' is outside 0..1", spec);
    }
    Ok((channel, x, y))
}

fn describe(preset: &CurvePreset) -> String {
    let mut out = format!("Name:       {}\nSaturation: {}\n", preset.name, preset.saturation);
    for channel in Channel::ALL {
        let spline = preset.spline(channel);
        let pairs: Vec<String> = spline
            .points()
            .iter()
            .map(|p| format!("({}, {})", (p.x * 255.0).round(), ((1.0 - p.y) * 255.0).round()))
            .collect();
        let state = if spline.lut().is_active() { "active" } else { "identity" };
        out.push_str(&format!("{:<6} {:<9} {}\n", channel.as_str(), state, pairs.join(" ")));
    }
    out
}
