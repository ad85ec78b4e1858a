//! Parallel grading using Rayon.
//!
//! The buffer is split into disjoint bands of whole rows; each band runs
//! the same loop as [`pipeline::apply`](crate::pipeline::apply), so the
//! output is identical to the serial path.
//!
//! # Example
//!
//! ```rust
//! use lumen_ops::{ColorMatrix, CurveLuts, parallel};
//!
//! let mut frame = vec![0xFF20_4060u32; 640 * 480];
//! let warm = ColorMatrix::scale(1.1, 1.05, 0.9);
//! parallel::apply_parallel(&mut frame, 640, 480, Some(&warm), &CurveLuts::none()).unwrap();
//! ```

use rayon::prelude::*;
use tracing::debug;

use crate::error::{OpsResult, check_buffer};
use crate::matrix::ColorMatrix;
use crate::pipeline::Plan;
use crate::snapshot::{CurveLuts, GradeSnapshot};

/// Rows per rayon task.
const BAND_ROWS: usize = 16;

/// Parallel [`apply`](crate::pipeline::apply).
pub fn apply_parallel(
    pixels: &mut [u32],
    width: u32,
    height: u32,
    matrix: Option<&ColorMatrix>,
    luts: &CurveLuts,
) -> OpsResult<()> {
    check_buffer(pixels.len(), width, height)?;
    let fused = luts.fuse();
    debug!(width, height, matrix = matrix.is_some(), curves = fused.is_some(), "apply_parallel");
    run_bands(pixels, width, Plan::new(matrix, fused.as_ref()));
    Ok(())
}

/// Parallel [`apply_snapshot`](crate::pipeline::apply_snapshot).
pub fn apply_snapshot_parallel(
    pixels: &mut [u32],
    width: u32,
    height: u32,
    snapshot: &GradeSnapshot,
) -> OpsResult<()> {
    check_buffer(pixels.len(), width, height)?;
    debug!(width, height, filter = %snapshot.filter(), "apply_snapshot_parallel");
    run_bands(pixels, width, Plan::from_snapshot(snapshot));
    Ok(())
}

fn run_bands(pixels: &mut [u32], width: u32, plan: Plan<'_>) {
    if pixels.is_empty() || matches!(plan, Plan::Noop) {
        return;
    }
    pixels
        .par_chunks_mut(width as usize * BAND_ROWS)
        .for_each(|band| plan.run(band));
}
