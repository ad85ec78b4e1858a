//! Grade command

use crate::ApplyArgs;
use crate::image_io::{read_png, write_png};
use anyhow::{Context, Result, bail};
use lumen_lut::CurveModel;
use lumen_ops::{CaptureOptions, FilterPreset, GradeSnapshot, WatermarkConfig, process_capture};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

pub fn run(args: ApplyArgs, verbose: u8) -> Result<()> {
    let image = read_png(&args.input)?;

    let mut model = match &args.preset {
        Some(path) => {
            let preset = super::load_preset(path)?;
            debug!(name = %preset.name, saturation = preset.saturation, "preset loaded");
            CurveModel::from_preset(&preset)
        }
        None => CurveModel::new(),
    };
    if let Some(saturation) = args.saturation {
        model.set_saturation(saturation);
    }
    let filter = parse_filter(&args.filter)?;

    let options = CaptureOptions {
        square: args.square,
        watermark: args.watermark.as_deref().map(load_watermark).transpose()?,
    };
    let snapshot = GradeSnapshot::new(&model, filter);

    if verbose > 0 {
        println!(
            "Grading {} ({}x{}) filter={} saturation={}",
            args.input.display(),
            image.width(),
            image.height(),
            filter,
            model.saturation()
        );
    }

    let start = Instant::now();
    let graded = if args.serial {
        rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .context("Failed to build serial pool")?
            .install(|| process_capture(&image, &snapshot, &options))?
    } else {
        process_capture(&image, &snapshot, &options)?
    };
    info!(
        width = graded.width(),
        height = graded.height(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "graded"
    );

    write_png(&args.output, &graded)?;

    if verbose > 0 {
        println!("Done.");
    }
    Ok(())
}

fn parse_filter(name: &str) -> Result<FilterPreset> {
    match FilterPreset::parse(name) {
        Some(filter) => Ok(filter),
        None => {
            let known: Vec<&str> = FilterPreset::ALL.iter().map(|f| f.as_str()).collect();
            bail!("Unknown filter '{}'. Available: {}", name, known.join(", "))
        }
    }
}

fn load_watermark(path: &Path) -> Result<WatermarkConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read watermark config: {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid watermark config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{ArgbImage, pixel};

    fn args(dir: &Path) -> ApplyArgs {
        ApplyArgs {
            input: dir.join("in.png"),
            output: dir.join("out.png"),
            preset: None,
            filter: "none".into(),
            saturation: None,
            square: false,
            watermark: None,
            serial: false,
        }
    }

    #[test]
    fn filter_names() {
        assert_eq!(parse_filter("B_W").unwrap(), FilterPreset::BlackWhite);
        let err = parse_filter("vaporwave").unwrap_err().to_string();
        assert!(err.contains("sepia"), "{err}");
    }

    #[test]
    fn grades_and_watermarks() {
        let dir = tempfile::tempdir().unwrap();
        let src = ArgbImage::filled(40, 20, pixel::pack(0xFF, 255, 0, 0)).unwrap();
        write_png(&dir.path().join("in.png"), &src).unwrap();
        std::fs::write(dir.path().join("wm.yaml"), "background-color: '#000000'\n").unwrap();

        let mut a = args(dir.path());
        a.filter = "bw".into();
        a.square = true;
        a.watermark = Some(dir.path().join("wm.yaml"));
        a.serial = true;
        run(a, 0).unwrap();

        let out = read_png(&dir.path().join("out.png")).unwrap();
        // 20x20 square plus a footer of floor(20 * 0.12) rows.
        assert_eq!(out.dimensions(), (20, 22));
        assert_eq!(out.pixel(0, 0), pixel::pack(0xFF, 54, 54, 54));
        assert_eq!(out.pixel(0, 21), pixel::BLACK);
    }

    #[test]
    fn bad_watermark_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wm.yaml"), "text-color: chartreuse\n").unwrap();
        assert!(load_watermark(&dir.path().join("wm.yaml")).is_err());
    }
}
