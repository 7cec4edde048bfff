//! Binary images.
//!
//! The recognition works on an already binarized sheet: every pixel is either
//! foreground (ink) or background. Producing that image from a gray scan is
//! left to the caller; [`BinaryImage::from_gray`] only applies a global
//! threshold.

use crate::error::CoreError;

/// A foreground/background pixel buffer stored row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl BinaryImage {
    /// Creates an image of the given size with every pixel set to background
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    /// Creates an image from a row-major buffer where `true` marks foreground.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ImageSize`] if the buffer length does not match
    /// the dimensions.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<bool>) -> Result<Self, CoreError> {
        if pixels.len() != width * height {
            return Err(CoreError::ImageSize {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates an image from 8-bit gray levels, pixels darker than
    /// `threshold` becoming foreground.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ImageSize`] if the buffer length does not match
    /// the dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::image::BinaryImage;
    /// let image = BinaryImage::from_gray(2, 1, &[0, 255], 128).unwrap();
    /// assert!(image.is_foreground(0, 0));
    /// assert!(!image.is_foreground(1, 0));
    /// ```
    pub fn from_gray(
        width: usize,
        height: usize,
        gray: &[u8],
        threshold: u8,
    ) -> Result<Self, CoreError> {
        Self::from_pixels(width, height, gray.iter().map(|&g| g < threshold).collect())
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Checks whether the pixel is foreground; out-of-image pixels are background
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    /// Sets a pixel, ignoring coordinates outside the image
    pub fn set(&mut self, x: usize, y: usize, foreground: bool) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = foreground;
        }
    }

    /// Paints a foreground rectangle, clipped to the image
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for yy in y..(y + height).min(self.height) {
            for xx in x..(x + width).min(self.width) {
                self.pixels[yy * self.width + xx] = true;
            }
        }
    }

    /// Number of foreground pixels
    pub fn foreground_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }
}
