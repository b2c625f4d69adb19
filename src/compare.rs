// src/compare.rs
//
// Masked pixel comparison and whole-image grey scans over RGB565 images.
// The compare predicate decides what "different" means; the mask predicate
// is pure geometry and decides which coordinates participate at all.

use crate::engine::Image;
use crate::error::{CamstageError, Result};
use crate::ops::ImageKind;
use crate::pixel::Pixel;

/// Mask admitting every coordinate.
pub fn no_mask(_x: u32, _y: u32, _width: u32, _height: u32) -> bool {
    true
}

fn center_distance_sq(x: u32, y: u32, width: u32, height: u32) -> i64 {
    let dx = x as i64 - (width / 2) as i64;
    let dy = y as i64 - (height / 2) as i64;
    dx * dx + dy * dy
}

/// Inside the circle inscribed in the image.
pub fn inside_circle(x: u32, y: u32, width: u32, height: u32) -> bool {
    let r = (width.min(height) / 2) as i64;
    center_distance_sq(x, y, width, height) <= r * r
}

/// Outside the circle inscribed in the image.
pub fn outside_circle(x: u32, y: u32, width: u32, height: u32) -> bool {
    !inside_circle(x, y, width, height)
}

/// Inside the concentric circle of a quarter of the inscribed radius.
pub fn inside_central_circle(x: u32, y: u32, width: u32, height: u32) -> bool {
    let r = (width.min(height) / 8) as i64;
    center_distance_sq(x, y, width, height) <= r * r
}

impl Image {
    fn check_rgb565(&self) -> Result<()> {
        if self.kind() != ImageKind::Rgb565 {
            return Err(CamstageError::PixelAccessUnsupported { kind: self.kind() });
        }
        Ok(())
    }

    /// Fraction of sampled pixel pairs the compare predicate flags as
    /// different, in [0, 1]. Both images must be RGB565 with identical
    /// geometry; `stride` subsamples both axes. Fails if nothing ends up
    /// sampled (stride beyond both dimensions, or a mask admitting nothing).
    pub fn compare_with<C, M>(
        &self,
        other: &Image,
        stride: u32,
        mut compare: C,
        mask: M,
    ) -> Result<f32>
    where
        C: FnMut(u32, u32, Pixel, Pixel) -> bool,
        M: Fn(u32, u32, u32, u32) -> bool,
    {
        if self.width() != other.width() || self.height() != other.height() {
            return Err(CamstageError::SizeMismatch {
                width: self.width(),
                height: self.height(),
                other_width: other.width(),
                other_height: other.height(),
            });
        }
        if self.kind() != ImageKind::Rgb565 || other.kind() != ImageKind::Rgb565 {
            return Err(CamstageError::CompareKindMismatch {
                kind: self.kind(),
                other_kind: other.kind(),
            });
        }
        if stride < 1 {
            return Err(CamstageError::InvalidStride { stride });
        }

        let (width, height) = (self.width(), self.height());
        let mut sampled = 0u64;
        let mut differing = 0u64;
        let mut y = 0;
        while y < height {
            let mut x = 0;
            while x < width {
                if mask(x, y, width, height) {
                    sampled += 1;
                    let a = self.pixel_at(x, y)?;
                    let b = other.pixel_at(x, y)?;
                    if compare(x, y, a, b) {
                        differing += 1;
                    }
                }
                x += stride;
            }
            y += stride;
        }
        if sampled == 0 {
            return Err(CamstageError::NothingSampled);
        }
        Ok(differing as f32 / sampled as f32)
    }

    /// Maximum luma over every masked pixel.
    pub fn max_grey<M>(&self, mask: M) -> Result<u8>
    where
        M: Fn(u32, u32, u32, u32) -> bool,
    {
        self.fold_grey(mask, u8::max)
    }

    /// Minimum luma over every masked pixel.
    pub fn min_grey<M>(&self, mask: M) -> Result<u8>
    where
        M: Fn(u32, u32, u32, u32) -> bool,
    {
        self.fold_grey(mask, u8::min)
    }

    fn fold_grey<M>(&self, mask: M, pick: impl Fn(u8, u8) -> u8) -> Result<u8>
    where
        M: Fn(u32, u32, u32, u32) -> bool,
    {
        self.check_rgb565()?;
        let mut extremum: Option<u8> = None;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if mask(x, y, self.width(), self.height()) {
                    let grey = self.pixel_at(x, y)?.grey();
                    extremum = Some(match extremum {
                        Some(cur) => pick(cur, grey),
                        None => grey,
                    });
                }
            }
        }
        extremum.ok_or(CamstageError::NothingSampled)
    }

    /// Invoke `action` for every masked pixel.
    pub fn foreach_pixel<M, A>(&self, mask: M, mut action: A) -> Result<()>
    where
        M: Fn(u32, u32, u32, u32) -> bool,
        A: FnMut(u32, u32, Pixel),
    {
        self.check_rgb565()?;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if mask(x, y, self.width(), self.height()) {
                    action(x, y, self.pixel_at(x, y)?);
                }
            }
        }
        Ok(())
    }
}
