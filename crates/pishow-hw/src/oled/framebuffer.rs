//! 1-bit framebuffer for monochrome OLED panels.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};

use crate::{Error, Result, OLED_HEIGHT, OLED_WIDTH};

/// Luma value at or above which a pixel is lit.
pub const LUMA_THRESHOLD: u8 = 128;

/// Packed 1-bit-per-pixel framebuffer, row-major, most significant bit first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonoFramebuffer {
    /// Packed pixel rows.
    data: Vec<u8>,
    /// Width of the framebuffer.
    width: u32,
    /// Height of the framebuffer.
    height: u32,
}

impl Default for MonoFramebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoFramebuffer {
    /// Creates a blank framebuffer sized for the 128x32 panel.
    pub fn new() -> Self {
        Self::with_dimensions(OLED_WIDTH, OLED_HEIGHT)
    }

    /// Creates a blank framebuffer with custom dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        let stride = Self::stride_for(width);
        Self {
            data: vec![0; stride * height as usize],
            width,
            height,
        }
    }

    fn stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    /// Returns the width of the framebuffer.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the framebuffer.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the packed pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fills the whole framebuffer with one value.
    pub fn clear(&mut self, on: bool) {
        self.data.fill(if on { 0xFF } else { 0x00 });
    }

    /// Sets a pixel; coordinates outside the buffer are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x < self.width && y < self.height {
            let (idx, mask) = self.locate(x, y);
            if on {
                self.data[idx] |= mask;
            } else {
                self.data[idx] &= !mask;
            }
        }
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<bool> {
        if x < self.width && y < self.height {
            let (idx, mask) = self.locate(x, y);
            Some(self.data[idx] & mask != 0)
        } else {
            None
        }
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let idx = y as usize * Self::stride_for(self.width) + x as usize / 8;
        (idx, 0x80 >> (x % 8))
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.lit_pixels().count()
    }

    /// Iterates over every lit pixel as `(x, y)`.
    pub fn lit_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| match self.get_pixel(x, y) {
                Some(true) => Some((x, y)),
                _ => None,
            })
        })
    }

    /// Copies an 8-bit luma image of exactly the framebuffer's size.
    ///
    /// Pixels at or above [`LUMA_THRESHOLD`] are lit. A source of any other
    /// size is rejected with [`Error::FramebufferSize`] and leaves the buffer
    /// untouched.
    pub fn copy_from_luma(&mut self, luma: &[u8], width: u32, height: u32) -> Result<()> {
        if width != self.width
            || height != self.height
            || luma.len() != width as usize * height as usize
        {
            return Err(Error::FramebufferSize {
                expected_width: self.width,
                expected_height: self.height,
                width,
                height,
            });
        }

        for (i, &value) in luma.iter().enumerate() {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            self.set_pixel(x, y, value >= LUMA_THRESHOLD);
        }
        Ok(())
    }
}

impl OriginDimensions for MonoFramebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for MonoFramebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::Point;

    #[test]
    fn test_framebuffer_ops() {
        let mut fb = MonoFramebuffer::new();
        assert_eq!(fb.width(), 128);
        assert_eq!(fb.height(), 32);
        assert_eq!(fb.data().len(), 16 * 32);

        fb.set_pixel(10, 20, true);
        assert_eq!(fb.get_pixel(10, 20), Some(true));
        assert_eq!(fb.get_pixel(11, 20), Some(false));
        assert_eq!(fb.lit_count(), 1);

        fb.clear(true);
        assert_eq!(fb.get_pixel(0, 0), Some(true));
        assert_eq!(fb.lit_count(), 128 * 32);

        fb.clear(false);
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut fb = MonoFramebuffer::with_dimensions(10, 3);
        fb.set_pixel(10, 0, true);
        fb.set_pixel(0, 3, true);
        assert_eq!(fb.lit_count(), 0);
        assert_eq!(fb.get_pixel(10, 0), None);
        // Width not a multiple of 8 still packs into two bytes per row.
        assert_eq!(fb.data().len(), 2 * 3);
    }

    #[test]
    fn test_copy_from_luma() {
        let mut fb = MonoFramebuffer::with_dimensions(4, 2);
        let luma = [0, 255, 127, 128, 255, 0, 0, 0];
        fb.copy_from_luma(&luma, 4, 2).unwrap();
        let lit: Vec<_> = fb.lit_pixels().collect();
        assert_eq!(lit, vec![(1, 0), (3, 0), (0, 1)]);
    }

    #[test]
    fn test_copy_from_luma_size_mismatch() {
        let mut fb = MonoFramebuffer::with_dimensions(128, 32);
        let luma = vec![255; 64 * 64];
        let err = fb.copy_from_luma(&luma, 64, 64).unwrap_err();
        assert!(matches!(
            err,
            Error::FramebufferSize {
                expected_width: 128,
                expected_height: 32,
                width: 64,
                height: 64
            }
        ));
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_draw_target_clips_negative() {
        let mut fb = MonoFramebuffer::with_dimensions(8, 8);
        fb.draw_iter([
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(2, -3), BinaryColor::On),
            Pixel(Point::new(2, 3), BinaryColor::On),
        ])
        .unwrap();
        assert_eq!(fb.lit_pixels().collect::<Vec<_>>(), vec![(2, 3)]);
    }
}
