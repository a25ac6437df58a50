//
// lib.rs
// Mammo-Prep-rs
//
// Exposes the crate's modules and re-exports the main preprocessing types for library consumers.
//
// Thales Matheus Mendonça Santos - November 2025

// Public surface of the library: leaf value types first, then transforms, then orchestration.
pub mod annotations;
pub mod attributes;
pub mod backend;
pub mod batch;
pub mod bbox;
pub mod buffers;
pub mod cli;
pub mod config;
pub mod dicom_access;
pub mod error;
pub mod intensity;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod pad;
pub mod source;
pub mod table;

pub use annotations::{AnnotationRow, AnnotationRowProcessor, EnrichedAnnotationRow, RowAccumulator};
pub use bbox::{BoundingBox, CoordinateTransformer, NormalizedBox};
pub use cli::{run as run_cli, Cli, Commands};
pub use config::PrepConfig;
pub use error::PrepError;
pub use normalize::IntensityNormalizer;
pub use pad::pad_to_square;
