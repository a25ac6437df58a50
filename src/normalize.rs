//
// normalize.rs
// Mammo-Prep-rs
//
// Window/level (or min-max) intensity normalization of decoded DICOM samples into 8-bit RGB.
//
// Thales Matheus Mendonça Santos - November 2025

use tracing::debug;

use crate::attributes::{DicomAttributes, Window};
use crate::backend::{Backend, PixelBackend};
use crate::buffers::{NormalizedImageBuffer, RawImageBuffer};
use crate::error::{PrepError, Result};

const OUTPUT_CHANNELS: usize = 3;

/// Converts raw samples plus their attributes into a displayable 8-bit image.
#[derive(Debug, Clone, Default)]
pub struct IntensityNormalizer<B = Backend> {
    backend: B,
    strict_devices: bool,
}

impl<B: PixelBackend> IntensityNormalizer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            strict_devices: false,
        }
    }

    /// Rejects multi-valued windows from devices missing in the policy table.
    pub fn strict_devices(mut self, strict: bool) -> Self {
        self.strict_devices = strict;
        self
    }

    pub fn normalize(
        &self,
        pixels: RawImageBuffer,
        attrs: &DicomAttributes,
    ) -> Result<NormalizedImageBuffer> {
        let channels = pixels.channels();
        let inverted = attrs.photometric_interpretation.is_inverted();
        let mut samples = pixels.into_samples();

        match attrs.resolve_window(self.strict_devices)? {
            Some(window) => {
                debug!(width = window.width, center = window.center, inverted, "Applying window/level");
                let mut level = window.center as f32;
                if inverted {
                    let padding = attrs.padding_value() as f32;
                    if padding != 0.0 {
                        // Saturated MONOCHROME1 samples are stored as 1.
                        self.backend
                            .map_inplace(&mut samples, move |v| if v == 1.0 { v + padding } else { v });
                    }
                    let (_, max) = self.backend.min_max(&samples).ok_or(PrepError::EmptyImage)?;
                    level = max - level;
                    self.backend.map_inplace(&mut samples, move |v| max - v);
                }
                self.apply_window(
                    &mut samples,
                    Window {
                        width: window.width,
                        center: level as f64,
                    },
                );
            }
            None => {
                if inverted {
                    let (_, max) = self.backend.min_max(&samples).ok_or(PrepError::EmptyImage)?;
                    self.backend.map_inplace(&mut samples, move |v| max - v);
                }
                self.stretch_min_max(&mut samples)?;
            }
        }

        let bytes = self.backend.to_u8(&samples);
        let bytes = if channels == 1 {
            self.backend.replicate_channels(&bytes, OUTPUT_CHANNELS)
        } else {
            bytes
        };
        NormalizedImageBuffer::new(bytes)
    }

    fn apply_window(&self, samples: &mut ndarray::Array3<f32>, window: Window) {
        let width = window.width as f32;
        let low = (window.center - window.width / 2.0) as f32;
        self.backend
            .map_inplace(samples, move |v| ((v - low) / width).clamp(0.0, 1.0) * 255.0);
    }

    fn stretch_min_max(&self, samples: &mut ndarray::Array3<f32>) -> Result<()> {
        let (min, max) = self.backend.min_max(samples).ok_or(PrepError::EmptyImage)?;
        let range = max - min;
        if range > 0.0 {
            self.backend
                .map_inplace(samples, move |v| (v - min) * 255.0 / range);
        } else {
            debug!(value = min, "Constant image, min-max stretch yields zeros");
            self.backend.map_inplace(samples, |_| 0.0);
        }
        Ok(())
    }
}
