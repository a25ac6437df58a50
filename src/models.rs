//
// models.rs
// Mammo-Prep-rs
//
// Defines serializable report structures for batch runs, per-row failures and attribute summaries.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

/// Coarse classification of an isolated failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Decode,
    MalformedPath,
    MalformedAttribute,
    Orientation,
    UnsupportedDevice,
    DuplicateOutput,
    Other,
}

impl From<&PrepError> for FailureKind {
    fn from(err: &PrepError) -> Self {
        match err {
            PrepError::Decode { .. } | PrepError::Io { .. } | PrepError::EmptyImage => {
                FailureKind::Decode
            }
            PrepError::MalformedPath { .. } => FailureKind::MalformedPath,
            PrepError::MalformedAttribute { .. } => FailureKind::MalformedAttribute,
            PrepError::OrientationAssumptionViolation { .. } => FailureKind::Orientation,
            PrepError::UnsupportedDeviceModel { .. } => FailureKind::UnsupportedDevice,
            PrepError::DuplicateOutput { .. } => FailureKind::DuplicateOutput,
            _ => FailureKind::Other,
        }
    }
}

/// A table row left out of the enriched output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    /// 0-based position in the input table.
    pub row: usize,
    pub path: String,
    pub id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// An image that could not be normalized or written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl ImageFailure {
    pub fn new(path: PathBuf, err: &PrepError) -> Self {
        Self {
            path,
            kind: FailureKind::from(err),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub rows_read: usize,
    pub rows_enriched: usize,
    pub distinct_images: usize,
    pub images_written: usize,
    pub row_failures: Vec<RowFailure>,
    pub image_failures: Vec<ImageFailure>,
}

/// What the normalizer will use for one DICOM file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSummary {
    pub rows: u32,
    pub columns: u32,
    pub photometric_interpretation: String,
    pub manufacturer_model: Option<String>,
    pub device_model: String,
    pub window_width: Option<Vec<f64>>,
    pub window_center: Option<Vec<f64>>,
    pub resolved_window: Option<(f64, f64)>,
    pub pixel_padding_value: f64,
}
