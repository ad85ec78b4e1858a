//! LUT dump command

use crate::LutArgs;
use anyhow::Result;
use lumen_lut::{CurveModel, Lut256};

pub fn run(args: LutArgs) -> Result<()> {
    let channel = super::parse_channel(&args.channel)?;
    let preset = super::load_preset(&args.preset)?;
    let lut = CurveModel::from_preset(&preset).lut(channel);

    println!("# {} / {} (active: {})", preset.name, channel, lut.is_active());
    for line in format_rows(&lut) {
        println!("{line}");
    }
    Ok(())
}

/// Sixteen entries per row.
fn format_rows(lut: &Lut256) -> Vec<String> {
    lut.as_array()
        .chunks(16)
        .map(|row| row.iter().map(|v| format!("{v:3}")).collect::<Vec<_>>().join(" "))
        .collect()
}
