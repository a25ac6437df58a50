//
// config.rs
// Mammo-Prep-rs
//
// Preprocessing settings loaded from an optional JSON file and overridden by CLI flags.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::bbox::{CoordinateTransformer, PaddingAxis, DEFAULT_TARGET_SIZE};
use crate::error::{PrepError, Result};
use crate::normalize::IntensityNormalizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepConfig {
    /// Side of the square canvas the box coordinates are expressed in.
    pub target_size: u32,
    /// First value of the `Number` column.
    pub number_seed: u32,
    pub backend: Backend,
    pub padding_axis: PaddingAxis,
    pub strict_device_models: bool,
    /// Exported images are resized to this side when set.
    pub export_size: Option<u32>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            number_seed: 1,
            backend: Backend::default(),
            padding_axis: PaddingAxis::default(),
            strict_device_models: false,
            export_size: None,
        }
    }
}

impl PrepConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PrepError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| PrepError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn transformer(&self) -> CoordinateTransformer {
        CoordinateTransformer::new(self.target_size).with_axis(self.padding_axis)
    }

    pub fn normalizer(&self) -> IntensityNormalizer<Backend> {
        IntensityNormalizer::new(self.backend).strict_devices(self.strict_device_models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("prep.json");
        std::fs::write(&path, r#"{ "backend": "serial", "padding_axis": "width-only" }"#)
            .expect("write config");

        let config = PrepConfig::load(&path).expect("load");
        assert_eq!(config.backend, Backend::Serial);
        assert_eq!(config.padding_axis, PaddingAxis::WidthOnly);
        assert_eq!(config.target_size, 1080);
        assert_eq!(config.number_seed, 1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("prep.json");
        std::fs::write(&path, r#"{ "target": 640 }"#).expect("write config");
        assert!(matches!(PrepConfig::load(&path), Err(PrepError::Json { .. })));
    }
}
