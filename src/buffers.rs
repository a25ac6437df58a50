//
// buffers.rs
// Mammo-Prep-rs
//
// Image buffers passed between decoding, normalization and padding (rows x columns x channels).
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use ndarray::{Array2, Array3, Axis};

use crate::error::{PrepError, Result};

/// Decoded samples of one frame, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImageBuffer {
    samples: Array3<f32>,
}

impl RawImageBuffer {
    /// Accepts single-channel or three-channel layouts with at least one sample.
    pub fn new(samples: Array3<f32>) -> Result<Self> {
        let (rows, cols, channels) = samples.dim();
        if channels != 1 && channels != 3 {
            return Err(PrepError::UnsupportedChannels(channels));
        }
        if rows == 0 || cols == 0 {
            return Err(PrepError::EmptyImage);
        }
        Ok(Self { samples })
    }

    pub fn from_gray(samples: Array2<f32>) -> Result<Self> {
        Self::new(samples.insert_axis(Axis(2)))
    }

    pub fn height(&self) -> usize {
        self.samples.dim().0
    }

    pub fn width(&self) -> usize {
        self.samples.dim().1
    }

    pub fn channels(&self) -> usize {
        self.samples.dim().2
    }

    pub fn samples(&self) -> &Array3<f32> {
        &self.samples
    }

    pub fn into_samples(self) -> Array3<f32> {
        self.samples
    }
}

/// 8-bit, 3-channel output of intensity normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImageBuffer {
    samples: Array3<u8>,
}

impl NormalizedImageBuffer {
    pub fn new(samples: Array3<u8>) -> Result<Self> {
        let (rows, cols, channels) = samples.dim();
        if channels != 3 {
            return Err(PrepError::UnsupportedChannels(channels));
        }
        if rows == 0 || cols == 0 {
            return Err(PrepError::EmptyImage);
        }
        Ok(Self { samples })
    }

    /// Raster inputs skip windowing and only need the RGB conversion.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let samples = Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
            rgb.get_pixel(x as u32, y as u32)[c]
        });
        Self::new(samples)
    }

    pub fn height(&self) -> usize {
        self.samples.dim().0
    }

    pub fn width(&self) -> usize {
        self.samples.dim().1
    }

    pub fn samples(&self) -> &Array3<u8> {
        &self.samples
    }
}

/// Normalized image centred on a zero-filled square canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareImageBuffer {
    samples: Array3<u8>,
    pub offset_y: usize,
    pub offset_x: usize,
    pub source_height: usize,
    pub source_width: usize,
}

impl SquareImageBuffer {
    pub(crate) fn from_parts(
        samples: Array3<u8>,
        offset_y: usize,
        offset_x: usize,
        source_height: usize,
        source_width: usize,
    ) -> Self {
        Self {
            samples,
            offset_y,
            offset_x,
            source_height,
            source_width,
        }
    }

    pub fn side(&self) -> usize {
        self.samples.dim().0
    }

    pub fn samples(&self) -> &Array3<u8> {
        &self.samples
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let side = self.side() as u32;
        RgbImage::from_fn(side, side, |x, y| {
            let (y, x) = (y as usize, x as usize);
            image::Rgb([
                self.samples[[y, x, 0]],
                self.samples[[y, x, 1]],
                self.samples[[y, x, 2]],
            ])
        })
    }

    /// Writes the canvas, optionally resized to `size x size` for the network input.
    pub fn save(&self, path: &Path, size: Option<u32>) -> Result<()> {
        let mut rgb = self.to_rgb_image();
        if let Some(size) = size {
            rgb = image::imageops::resize(&rgb, size, size, FilterType::Lanczos3);
        }
        rgb.save(path).map_err(|source| PrepError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
