//
// backend.rs
// Mammo-Prep-rs
//
// Elementwise sample arithmetic behind one interface, with a serial and a rayon-backed implementation.
//
// Thales Matheus Mendonça Santos - November 2025

use clap::ValueEnum;
use ndarray::parallel::prelude::*;
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};

/// The array operations the normalizer needs. Both backends must produce identical results.
pub trait PixelBackend {
    fn map_inplace<F>(&self, samples: &mut Array3<f32>, f: F)
    where
        F: Fn(f32) -> f32 + Sync + Send;

    /// `None` for an empty buffer.
    fn min_max(&self, samples: &Array3<f32>) -> Option<(f32, f32)>;

    /// Truncating cast; callers clamp into [0, 255] first.
    fn to_u8(&self, samples: &Array3<f32>) -> Array3<u8>;

    /// Copies a single-channel buffer into `channels` identical planes.
    fn replicate_channels(&self, gray: &Array3<u8>, channels: usize) -> Array3<u8> {
        let (rows, cols, _) = gray.dim();
        Array3::from_shape_fn((rows, cols, channels), |(y, x, _)| gray[[y, x, 0]])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelBackend;

impl PixelBackend for SerialBackend {
    fn map_inplace<F>(&self, samples: &mut Array3<f32>, f: F)
    where
        F: Fn(f32) -> f32 + Sync + Send,
    {
        samples.mapv_inplace(f);
    }

    fn min_max(&self, samples: &Array3<f32>) -> Option<(f32, f32)> {
        if samples.is_empty() {
            return None;
        }
        let min = samples.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = samples.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        Some((min, max))
    }

    fn to_u8(&self, samples: &Array3<f32>) -> Array3<u8> {
        samples.mapv(|v| v as u8)
    }
}

impl PixelBackend for ParallelBackend {
    fn map_inplace<F>(&self, samples: &mut Array3<f32>, f: F)
    where
        F: Fn(f32) -> f32 + Sync + Send,
    {
        samples.par_mapv_inplace(f);
    }

    fn min_max(&self, samples: &Array3<f32>) -> Option<(f32, f32)> {
        if samples.is_empty() {
            return None;
        }
        let identity = || (f32::INFINITY, f32::NEG_INFINITY);
        let (min, max) = samples
            .par_iter()
            .fold(identity, |(lo, hi), &v| (lo.min(v), hi.max(v)))
            .reduce(identity, |a, b| (a.0.min(b.0), a.1.max(b.1)));
        Some((min, max))
    }

    fn to_u8(&self, samples: &Array3<f32>) -> Array3<u8> {
        let mut out = Array3::<u8>::zeros(samples.raw_dim());
        Zip::from(&mut out)
            .and(samples)
            .par_for_each(|o, &v| *o = v as u8);
        out
    }
}

/// Backend selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Serial,
    #[default]
    Parallel,
}

impl PixelBackend for Backend {
    fn map_inplace<F>(&self, samples: &mut Array3<f32>, f: F)
    where
        F: Fn(f32) -> f32 + Sync + Send,
    {
        match self {
            Backend::Serial => SerialBackend.map_inplace(samples, f),
            Backend::Parallel => ParallelBackend.map_inplace(samples, f),
        }
    }

    fn min_max(&self, samples: &Array3<f32>) -> Option<(f32, f32)> {
        match self {
            Backend::Serial => SerialBackend.min_max(samples),
            Backend::Parallel => ParallelBackend.min_max(samples),
        }
    }

    fn to_u8(&self, samples: &Array3<f32>) -> Array3<u8> {
        match self {
            Backend::Serial => SerialBackend.to_u8(samples),
            Backend::Parallel => ParallelBackend.to_u8(samples),
        }
    }
}
