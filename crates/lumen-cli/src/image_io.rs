//! PNG reading and writing for packed ARGB images.
//!
//! 8-bit RGB, RGBA, gray and gray-alpha are read; output is always 8-bit
//! RGBA with an sRGB chunk.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result, bail};
use lumen_core::ArgbImage;

/// Reads a PNG into an [`ArgbImage`].
pub fn read_png(path: &Path) -> Result<ArgbImage> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let mut reader = decoder
        .read_info()
        .with_context(|| format!("Failed to decode: {}", path.display()))?;

    let buf_size = reader
        .output_buffer_size()
        .context("cannot determine PNG output buffer size")?;
    let mut buf = vec![0u8; buf_size];
    let info = reader.next_frame(&mut buf)?;
    let data = &buf[..info.buffer_size()];

    let (channels, bytes) = match (info.color_type, info.bit_depth) {
        (png::ColorType::Rgb, png::BitDepth::Eight) => (3, data.to_vec()),
        (png::ColorType::Rgba, png::BitDepth::Eight) => (4, data.to_vec()),
        (png::ColorType::Grayscale, png::BitDepth::Eight) => (3, data.iter().flat_map(|&g| [g, g, g]).collect()),
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => (
            4,
            data.chunks_exact(2).flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]]).collect(),
        ),
        (color_type, bit_depth) => bail!("unsupported PNG layout: {color_type:?} {bit_depth:?}"),
    };
    Ok(ArgbImage::from_bytes(info.width, info.height, channels, &bytes)?)
}

/// Writes an [`ArgbImage`] as 8-bit RGBA PNG.
pub fn write_png(path: &Path, image: &ArgbImage) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.to_rgba8())?;
    writer.finish()?;
    Ok(())
}
