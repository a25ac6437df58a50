//
// batch.rs
// Mammo-Prep-rs
//
// Batch runs: table enrichment, parallel export of square training images and directory conversion.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::annotations::{number_rows, AnnotationRow, AnnotationRowProcessor, EnrichedAnnotationRow};
use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use crate::models::{FailureKind, ImageFailure, RowFailure};
use crate::source::{image_dimensions, prepare_training_image};

const IMAGE_EXTENSIONS: &[&str] = &["dcm", "dicom", "png", "jpg", "jpeg", "tif", "tiff", "pgm", "bmp"];

/// Enriched rows in input order plus the rows that were left out.
#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    pub rows: Vec<EnrichedAnnotationRow>,
    pub failures: Vec<RowFailure>,
    pub distinct_images: usize,
}

#[derive(Debug, Default)]
pub struct ExportOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ImageFailure>,
}

/// Enriches rows, probing each distinct image on disk once.
pub fn enrich_rows(rows: Vec<AnnotationRow>, config: &PrepConfig) -> Result<EnrichmentOutcome> {
    enrich_rows_with(rows, config, |path| image_dimensions(path))
}

/// Same as [`enrich_rows`] with a caller-supplied `(height, width)` probe.
///
/// Ungrouped tables abort the run. Everything else fails per row: the row is
/// dropped from the output and recorded in `failures`.
pub fn enrich_rows_with<F>(
    rows: Vec<AnnotationRow>,
    config: &PrepConfig,
    probe: F,
) -> Result<EnrichmentOutcome>
where
    F: Fn(&Path) -> Result<(u32, u32)> + Sync,
{
    let numbering = number_rows(rows.iter().map(|r| r.abs_path.as_str()), config.number_seed)?;

    let mut distinct: Vec<&str> = rows.iter().map(|r| r.abs_path.as_str()).collect();
    distinct.dedup();
    let dimensions: HashMap<&str, std::result::Result<(u32, u32), PrepError>> = distinct
        .par_iter()
        .map(|path| (*path, probe(Path::new(path))))
        .collect();
    info!(rows = rows.len(), images = distinct.len(), "Probed image dimensions");

    let processor = AnnotationRowProcessor::new(config.transformer());
    let mut outcome = EnrichmentOutcome {
        distinct_images: distinct.len(),
        ..Default::default()
    };

    for (position, (row, numbering)) in rows.iter().zip(numbering).enumerate() {
        let result = match dimensions.get(row.abs_path.as_str()) {
            Some(Ok((height, width))) => processor.enrich(row.clone(), numbering, *height, *width),
            Some(Err(err)) => Err(PrepError::Decode {
                path: PathBuf::from(&row.abs_path),
                message: err.to_string(),
            }),
            None => Err(PrepError::Decode {
                path: PathBuf::from(&row.abs_path),
                message: "image was not probed".to_string(),
            }),
        };

        match result {
            Ok(enriched) => outcome.rows.push(enriched),
            Err(err) => {
                warn!(row = position, path = %row.abs_path, error = %err, "Skipping row");
                outcome.failures.push(RowFailure {
                    row: position,
                    path: row.abs_path.clone(),
                    id: row.id.clone(),
                    kind: FailureKind::from(&err),
                    message: err.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Distinct `(AbsPath, ImageName, Number)` triples of an enriched table, in order.
pub fn distinct_images(rows: &[EnrichedAnnotationRow]) -> Vec<(String, String, u32)> {
    let mut images: Vec<(String, String, u32)> = rows
        .iter()
        .map(|r| (r.row.abs_path.clone(), r.image_name.clone(), r.number))
        .collect();
    images.dedup_by(|a, b| a.0 == b.0);
    images
}

fn output_name(image_name: &str, number: u32) -> String {
    if image_name.is_empty() || image_name == "Unknown" {
        format!("image_{:05}.png", number)
    } else {
        format!("{}.png", image_name)
    }
}

/// Output file per image. Names shared by several images get the image number appended.
fn export_targets(images: &[(String, String, u32)], out_dir: &Path) -> Vec<(PathBuf, PathBuf)> {
    let mut uses: HashMap<String, usize> = HashMap::new();
    for (_, image_name, number) in images {
        *uses.entry(output_name(image_name, *number)).or_default() += 1;
    }
    images
        .iter()
        .map(|(abs_path, image_name, number)| {
            let mut file = output_name(image_name, *number);
            if uses.get(&file).copied().unwrap_or(0) > 1 {
                file = format!("{}_{:05}.png", image_name, number);
            }
            (PathBuf::from(abs_path), out_dir.join(file))
        })
        .collect()
}

/// Keeps the first source for each target; later sources become failures.
fn claim_targets(
    pairs: Vec<(PathBuf, PathBuf)>,
) -> Vec<(PathBuf, std::result::Result<PathBuf, ImageFailure>)> {
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    pairs
        .into_iter()
        .map(|(source, target)| {
            let claim = match claimed.get(&target) {
                Some(first) => {
                    let err = PrepError::DuplicateOutput {
                        target,
                        first: first.clone(),
                    };
                    warn!(path = %source.display(), error = %err, "Skipping image");
                    Err(ImageFailure::new(source.clone(), &err))
                }
                None => {
                    claimed.insert(target.clone(), source.clone());
                    Ok(target)
                }
            };
            (source, claim)
        })
        .collect()
}

fn collect_outcome(results: Vec<std::result::Result<PathBuf, ImageFailure>>) -> ExportOutcome {
    let mut outcome = ExportOutcome::default();
    for result in results {
        match result {
            Ok(path) => outcome.written.push(path),
            Err(failure) => outcome.failures.push(failure),
        }
    }
    outcome
}

/// Normalizes, letterboxes and writes every image as `<ImageName>.png` in `out_dir`
/// (`<ImageName>_<Number>.png` when several images share a name).
pub fn export_images(
    images: &[(String, String, u32)],
    out_dir: &Path,
    config: &PrepConfig,
) -> Result<ExportOutcome> {
    fs::create_dir_all(out_dir).map_err(|source| PrepError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let normalizer = config.normalizer();
    let claims = claim_targets(export_targets(images, out_dir));

    let results: Vec<std::result::Result<PathBuf, ImageFailure>> = claims
        .into_par_iter()
        .map(|(source, claim)| {
            let target = claim?;
            prepare_training_image(&source, &normalizer)
                .and_then(|square| square.save(&target, config.export_size))
                .map(|_| target)
                .map_err(|err| {
                    warn!(path = %source.display(), error = %err, "Image export failed");
                    ImageFailure::new(source, &err)
                })
        })
        .collect();

    let outcome = collect_outcome(results);
    info!(
        written = outcome.written.len(),
        failed = outcome.failures.len(),
        "Image export finished"
    );
    Ok(outcome)
}

/// Converts every DICOM/raster file below `dir` into a square PNG in `out_dir`,
/// mirroring the relative directory layout. Files that differ only in extension
/// map to the same PNG; the first in walk order wins.
pub fn convert_directory(dir: &Path, out_dir: &Path, config: &PrepConfig) -> Result<ExportOutcome> {
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| {
                    IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .collect();
    info!(directory = %dir.display(), files = files.len(), "Converting directory");

    let pairs = files
        .into_iter()
        .map(|source| {
            let relative = source.strip_prefix(dir).unwrap_or(&source);
            let target = out_dir.join(relative).with_extension("png");
            (source, target)
        })
        .collect();
    let claims = claim_targets(pairs);

    let normalizer = config.normalizer();
    let results: Vec<std::result::Result<PathBuf, ImageFailure>> = claims
        .into_par_iter()
        .map(|(source, claim)| {
            let target = claim?;
            let write = || -> Result<()> {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| PrepError::Io {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
                }
                prepare_training_image(&source, &normalizer)?.save(&target, config.export_size)
            };
            match write() {
                Ok(()) => Ok(target),
                Err(err) => {
                    warn!(path = %source.display(), error = %err, "Conversion failed");
                    Err(ImageFailure::new(source, &err))
                }
            }
        })
        .collect();

    Ok(collect_outcome(results))
}
