//! Owned packed-ARGB image buffer.
//!
//! [`ArgbImage`] is the frame type passed between the pipeline, the capture
//! path and the CLI. Pixels are `0xAARRGGBB`, row-major, with no row
//! padding, so `pixels().len() == width * height` always holds.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::ArgbImage;
//!
//! let img = ArgbImage::filled(4, 2, 0xFF10_2030).unwrap();
//! assert_eq!(img.pixel(3, 1), 0xFF10_2030);
//!
//! let sq = img.crop_center_square();
//! assert_eq!(sq.dimensions(), (2, 2));
//! ```

use crate::error::{Error, Result};
use crate::pixel;

/// Packed `0xAARRGGBB` image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgbImage {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl ArgbImage {
    /// Creates a transparent-black image.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] when either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::filled(width, height, 0)
    }

    /// Creates an image with every pixel set to `argb`.
    pub fn filled(width: u32, height: u32, argb: u32) -> Result<Self> {
        let len = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![argb; len],
        })
    }

    /// Wraps an existing pixel vector.
    ///
    /// # Errors
    ///
    /// [`Error::SizeMismatch`] when `data.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, data: Vec<u32>) -> Result<Self> {
        let len = pixel_count(width, height)?;
        if data.len() != len {
            return Err(Error::SizeMismatch {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Builds an image from interleaved 8-bit RGB (`channels == 3`, opaque)
    /// or RGBA (`channels == 4`) bytes.
    pub fn from_bytes(width: u32, height: u32, channels: usize, bytes: &[u8]) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(Error::UnsupportedChannels(channels));
        }
        let len = pixel_count(width, height)?;
        if bytes.len() != len * channels {
            return Err(Error::SizeMismatch {
                expected: len * channels,
                actual: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(channels)
            .map(|c| {
                let a = if channels == 4 { c[3] } else { 0xFF };
                pixel::pack(a, c[0], c[1], c[2])
            })
            .collect();
        Ok(Self { width, height, data })
    }

    /// Interleaved 8-bit RGBA bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 4);
        for &p in &self.data {
            let (a, r, g, b) = pixel::unpack(p);
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// All pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    /// Mutable pixel slice, row-major.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Consumes the image and returns its pixel vector.
    pub fn into_pixels(self) -> Vec<u32> {
        self.data
    }

    /// Pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.data[self.index(x, y)]
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.data[self.index(x, y)])
    }

    /// Sets the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        let i = self.index(x, y);
        self.data[i] = argb;
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> &[u32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Copies the `w`x`h` region starting at `(x, y)` into a new image.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRegion`] when the region is empty or leaves the image.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Result<Self> {
        let fits = w > 0
            && h > 0
            && x.checked_add(w).is_some_and(|r| r <= self.width)
            && y.checked_add(h).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(Error::InvalidRegion {
                rx: x,
                ry: y,
                rw: w,
                rh: h,
                width: self.width,
                height: self.height,
            });
        }
        let mut data = Vec::with_capacity(w as usize * h as usize);
        for row in y..y + h {
            let start = self.index(x, row);
            data.extend_from_slice(&self.data[start..start + w as usize]);
        }
        Ok(Self {
            width: w,
            height: h,
            data,
        })
    }

    /// Largest centred square, `min(width, height)` on a side, offset by
    /// `((w - side) / 2, (h - side) / 2)` with integer division.
    pub fn crop_center_square(&self) -> Self {
        let side = self.width.min(self.height);
        let x = (self.width - side) / 2;
        let y = (self.height - side) / 2;
        let mut data = Vec::with_capacity(side as usize * side as usize);
        for row in y..y + side {
            let start = self.index(x, row);
            data.extend_from_slice(&self.data[start..start + side as usize]);
        }
        Self {
            width: side,
            height: side,
            data,
        }
    }

    #[inline(always)]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(Error::InvalidDimensions { width, height })
}
