//! Image buffer wrapper for captured pixels
//!
//! Native capture paths hand back raw 32-bit BGRA rows; [`ImageBuffer::from_bgra`]
//! turns them into an RGBA image ready for PNG encoding.
//!
//! # Examples
//!
//! ```
//! use wintest_core::{capture::ImageBuffer, model::Region};
//!
//! let screen = ImageBuffer::from_test_pattern(1920, 1080);
//! let region = Region::new(100, 100, 800, 400).unwrap();
//! let cropped = screen.crop(region).unwrap();
//! assert_eq!(cropped.dimensions(), (800, 400));
//! ```

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::{
    error::{AutomationError, AutomationResult},
    model::Region,
};

/// Wrapper around `image::DynamicImage` holding one captured frame
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    inner: DynamicImage,
}

impl ImageBuffer {
    /// Creates a new ImageBuffer from a DynamicImage
    pub fn new(image: DynamicImage) -> Self {
        Self { inner: image }
    }

    /// Builds an RGBA image from top-down 32-bit BGRA pixels
    ///
    /// The alpha channel is forced to opaque: GDI leaves it undefined for
    /// most windows.
    pub fn from_bgra(width: u32, height: u32, mut bgra: Vec<u8>) -> AutomationResult<Self> {
        let expected = width as usize * height as usize * 4;
        if bgra.len() != expected {
            return Err(AutomationError::ImageError(format!(
                "pixel buffer holds {} bytes, expected {} for {}x{}",
                bgra.len(),
                expected,
                width,
                height
            )));
        }

        for px in bgra.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }

        let rgba = RgbaImage::from_raw(width, height, bgra).ok_or_else(|| {
            AutomationError::ImageError(format!("invalid {}x{} frame", width, height))
        })?;
        Ok(Self::new(DynamicImage::ImageRgba8(rgba)))
    }

    /// Crops the image to the specified region
    ///
    /// The region must lie within the image bounds.
    pub fn crop(&self, region: Region) -> AutomationResult<Self> {
        let (img_width, img_height) = self.dimensions();

        if region.x >= img_width || region.y >= img_height {
            return Err(AutomationError::InvalidParameter {
                parameter: "region".to_string(),
                reason: format!(
                    "Region origin ({}, {}) is outside screen bounds ({}x{})",
                    region.x, region.y, img_width, img_height
                ),
            });
        }

        if region.x + region.width > img_width || region.y + region.height > img_height {
            return Err(AutomationError::InvalidParameter {
                parameter: "region".to_string(),
                reason: format!(
                    "Region ({}x{} at {},{}) extends beyond screen bounds ({}x{})",
                    region.width, region.height, region.x, region.y, img_width, img_height
                ),
            });
        }

        let cropped = self
            .inner
            .crop_imm(region.x, region.y, region.width, region.height);
        Ok(Self::new(cropped))
    }

    /// Returns the dimensions of the image as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// Converts the image to RGBA8 format
    pub fn to_rgba8(&self) -> RgbaImage {
        self.inner.to_rgba8()
    }

    /// Creates a test pattern image with the specified dimensions
    ///
    /// Vertical gradient from blue (top) to cyan (bottom), used by the mock
    /// backend as a stand-in for the desktop.
    pub fn from_test_pattern(width: u32, height: u32) -> Self {
        let start = [0f32, 0.0, 255.0];
        let end = [0f32, 255.0, 255.0];

        let img = RgbaImage::from_fn(width, height, |_x, y| {
            let ratio = y as f32 / height.max(1) as f32;
            let mix = |i: usize| (start[i] * (1.0 - ratio) + end[i] * ratio) as u8;
            Rgba([mix(0), mix(1), mix(2), 255])
        });

        Self::new(DynamicImage::ImageRgba8(img))
    }

    /// Solid-colour image, used by the mock backend for window contents
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let img = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        Self::new(DynamicImage::ImageRgba8(img))
    }
}
