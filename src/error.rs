//
// error.rs
// Mammo-Prep-rs
//
// Typed failures surfaced by the preprocessing library; the CLI wraps them with anyhow context.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for preprocessing operations.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image or DICOM file could not be opened or decoded.
    #[error("Failed to decode {path:?}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Window/level (or another numeric attribute) is present but unusable.
    #[error("Malformed {attribute} attribute: {reason}")]
    MalformedAttribute {
        attribute: &'static str,
        reason: String,
    },

    #[error("Device model {model:?} has no window policy and carries a multi-valued {attribute}")]
    UnsupportedDeviceModel {
        model: String,
        attribute: &'static str,
    },

    #[error("Path {path:?} has {found} segment(s) but source {source_name} needs index {required}")]
    MalformedPath {
        path: String,
        source_name: String,
        required: usize,
        found: usize,
    },

    #[error("Image is {width} wide and {height} tall; width-only padding assumes portrait orientation")]
    OrientationAssumptionViolation { height: u32, width: u32 },

    #[error("Rows for {path:?} are not contiguous (seen again at row {row}); sort the table by AbsPath")]
    UngroupedTable { path: String, row: usize },

    #[error("Image numbering starting at {seed} overflows at row {row}")]
    NumberingOverflow { seed: u32, row: usize },

    /// Two inputs would be written to the same output file.
    #[error("Output {target:?} is already claimed by {first:?}")]
    DuplicateOutput { target: PathBuf, first: PathBuf },

    #[error("Unsupported sample layout: {0} channel(s)")]
    UnsupportedChannels(usize),

    #[error("Image has no samples")]
    EmptyImage,

    #[error("Failed to read or write table {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to handle JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write image {path:?}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, PrepError>;
