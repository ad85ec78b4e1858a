//! Full-resolution capture processing.
//!
//! Order: optional centre-square crop, grade, then the watermark footer
//! when the footer style is enabled. The overlay style draws text only,
//! so the pixels leave here unchanged for that case.

use lumen_core::ArgbImage;
use tracing::debug;

use crate::error::OpsResult;
use crate::pipeline;
use crate::snapshot::GradeSnapshot;
use crate::watermark::{WatermarkConfig, WatermarkLayout, extend_with_footer};

/// Per-capture switches.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Crop to the largest centred square first.
    pub square: bool,
    /// Watermark settings, `None` to skip.
    pub watermark: Option<WatermarkConfig>,
}

/// Processes one captured frame.
pub fn process_capture(image: &ArgbImage, snapshot: &GradeSnapshot, options: &CaptureOptions) -> OpsResult<ArgbImage> {
    let mut out = if options.square {
        image.crop_center_square()
    } else {
        image.clone()
    };
    pipeline::apply_image(&mut out, snapshot)?;

    let Some(wm) = options.watermark.as_ref().filter(|wm| wm.enabled) else {
        return Ok(out);
    };
    let (width, height) = out.dimensions();
    let layout = WatermarkLayout::compute(width, height, wm);
    if wm.style_footer {
        debug!(width, height, footer = layout.footer_height, "footer watermark");
        extend_with_footer(&out, wm)
    } else {
        debug!(width, height, size = layout.overlay_font, "overlay watermark");
        Ok(out)
    }
}
