//! Frame handoff between the grading worker and its consumers.
//!
//! The worker takes a back buffer with [`FrameExchange::acquire`], fills
//! it, and publishes it with [`FrameExchange::publish`]. Consumers call
//! [`FrameExchange::latest`] and always get a whole frame; a frame being
//! written is never visible. When the previous front frame has no other
//! holders its storage becomes the next back buffer, so steady-state
//! preview allocates nothing.

use std::sync::Arc;

use lumen_core::ArgbImage;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::OpsResult;
use crate::pipeline;
use crate::snapshot::GradeSnapshot;

#[derive(Debug, Default)]
struct Slots {
    front: Option<Arc<ArgbImage>>,
    spare: Option<ArgbImage>,
    published: u64,
}

/// Single-producer frame exchange.
#[derive(Debug, Default)]
pub struct FrameExchange {
    slots: Mutex<Slots>,
}

impl FrameExchange {
    /// Empty exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Back buffer of `width` x `height`.
    ///
    /// Reuses the spare buffer when its size matches; contents are
    /// whatever the recycled frame held.
    pub fn acquire(&self, width: u32, height: u32) -> OpsResult<ArgbImage> {
        let spare = self.slots.lock().spare.take();
        match spare {
            Some(img) if img.dimensions() == (width, height) => Ok(img),
            _ => {
                trace!(width, height, "allocating frame buffer");
                Ok(ArgbImage::new(width, height)?)
            }
        }
    }

    /// Makes `frame` the front frame and returns its sequence number
    /// (starting at 1).
    pub fn publish(&self, frame: ArgbImage) -> u64 {
        let mut slots = self.slots.lock();
        let old = slots.front.replace(Arc::new(frame));
        slots.published += 1;
        if let Some(old) = old {
            // Still held by a consumer: drop our handle and let them keep it.
            if let Ok(img) = Arc::try_unwrap(old) {
                slots.spare = Some(img);
            }
        }
        slots.published
    }

    /// Most recent whole frame, if any.
    pub fn latest(&self) -> Option<Arc<ArgbImage>> {
        self.slots.lock().front.clone()
    }

    /// Frames published so far.
    pub fn frame_count(&self) -> u64 {
        self.slots.lock().published
    }
}

/// Copies `source` into a back buffer, grades it and publishes it.
pub fn process_frame(exchange: &FrameExchange, source: &ArgbImage, snapshot: &GradeSnapshot) -> OpsResult<u64> {
    let (width, height) = source.dimensions();
    let mut frame = exchange.acquire(width, height)?;
    frame.pixels_mut().copy_from_slice(source.pixels());
    pipeline::apply_image(&mut frame, snapshot)?;
    Ok(exchange.publish(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterPreset;
    use lumen_core::pixel;
    use lumen_lut::CurveModel;

    #[test]
    fn latest_is_last_published() {
        let ex = FrameExchange::new();
        assert!(ex.latest().is_none());
        let a = ArgbImage::filled(2, 2, pixel::WHITE).unwrap();
        assert_eq!(ex.publish(a), 1);
        let b = ArgbImage::filled(2, 2, pixel::BLACK).unwrap();
        assert_eq!(ex.publish(b), 2);
        assert_eq!(ex.latest().unwrap().pixel(0, 0), pixel::BLACK);
        assert_eq!(ex.frame_count(), 2);
    }

    #[test]
    fn recycles_unheld_buffer() {
        let ex = FrameExchange::new();
        ex.publish(ArgbImage::filled(4, 3, pixel::WHITE).unwrap());
        ex.publish(ArgbImage::new(4, 3).unwrap());
        // First frame had no readers, so it came back as the spare.
        let back = ex.acquire(4, 3).unwrap();
        assert_eq!(back.pixel(0, 0), pixel::WHITE);
    }

    #[test]
    fn held_frame_is_not_recycled() {
        let ex = FrameExchange::new();
        ex.publish(ArgbImage::filled(2, 2, pixel::WHITE).unwrap());
        let held = ex.latest().unwrap();
        ex.publish(ArgbImage::new(2, 2).unwrap());
        let back = ex.acquire(2, 2).unwrap();
        assert_eq!(back.pixel(0, 0), 0);
        assert_eq!(held.pixel(0, 0), pixel::WHITE);
    }

    #[test]
    fn resolution_change_allocates() {
        let ex = FrameExchange::new();
        ex.publish(ArgbImage::filled(2, 2, pixel::WHITE).unwrap());
        ex.publish(ArgbImage::new(2, 2).unwrap());
        let back = ex.acquire(3, 3).unwrap();
        assert_eq!(back.dimensions(), (3, 3));
    }

    #[test]
    fn process_frame_publishes_graded_copy() {
        let ex = FrameExchange::new();
        let src = ArgbImage::filled(5, 4, pixel::pack(0xFF, 255, 0, 0)).unwrap();
        let snap = GradeSnapshot::new(&CurveModel::new(), FilterPreset::BlackWhite);
        assert_eq!(process_frame(&ex, &src, &snap).unwrap(), 1);
        let out = ex.latest().unwrap();
        assert_eq!(pixel::red(out.pixel(4, 3)), 54);
        assert_eq!(src.pixel(4, 3), pixel::pack(0xFF, 255, 0, 0));
    }
}
