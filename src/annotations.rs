//
// annotations.rs
// Mammo-Prep-rs
//
// Annotation rows, per-image numbering, label codes, image-name derivation and the row processor.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bbox::{BoundingBox, CoordinateTransformer, NormalizedBox};
use crate::error::{PrepError, Result};

/// Dataset an annotation row comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Cesm,
    InBreast,
    Cbis,
    Bmcd,
    Mias,
    VinDr,
    Other(String),
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        let value = value.trim();
        match value {
            "CESM" => Source::Cesm,
            "INbreast" => Source::InBreast,
            "CBIS" => Source::Cbis,
            "BMCD" => Source::Bmcd,
            "MIAS" => Source::Mias,
            "VinDr" => Source::VinDr,
            _ => Source::Other(value.to_string()),
        }
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Cesm => "CESM",
            Source::InBreast => "INbreast",
            Source::Cbis => "CBIS",
            Source::Bmcd => "BMCD",
            Source::Mias => "MIAS",
            Source::VinDr => "VinDr",
            Source::Other(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

impl Source {
    /// Inclusive range of path parts joined into the image name.
    pub fn name_parts(&self) -> Option<(usize, usize)> {
        match self {
            Source::Cesm => Some((7, 10)),
            Source::InBreast => Some((7, 11)),
            Source::Cbis => Some((8, 12)),
            Source::Bmcd => Some((11, 14)),
            Source::Mias => Some((7, 7)),
            Source::VinDr => Some((8, 8)),
            Source::Other(_) => None,
        }
    }
}

/// One bounding box as read from the annotation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRow {
    #[serde(rename = "AbsPath")]
    pub abs_path: String,
    #[serde(rename = "Source")]
    pub source: Source,
    #[serde(rename = "Type")]
    pub finding: String,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub id: String,
}

impl AnnotationRow {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            xmin: self.xmin,
            ymin: self.ymin,
            xmax: self.xmax,
            ymax: self.ymax,
        }
    }
}

/// Position of a row among the distinct images of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowNumbering {
    /// 1-based (by default) id of the distinct image.
    pub number: u32,
    /// 1-based position of the box within its image.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedAnnotationRow {
    pub row: AnnotationRow,
    pub number: u32,
    pub index: u32,
    pub label: u8,
    pub image_name: String,
    pub coordinates: NormalizedBox,
}

pub fn label_for_finding(finding: &str) -> u8 {
    match finding.trim() {
        "Architectural distortion" => 1,
        "Mass" => 2,
        "Calcification" => 3,
        _ => 0,
    }
}

/// Splits like a regex on `[/\\_.]`, keeping empty parts so indices match the
/// directory depth (a leading `/` yields an empty first part).
pub fn path_parts(path: &str) -> Vec<&str> {
    path.split(['/', '\\', '_', '.']).collect()
}

pub fn image_name(abs_path: &str, source: &Source) -> Result<String> {
    let Some((first, last)) = source.name_parts() else {
        return Ok("Unknown".to_string());
    };
    let parts = path_parts(abs_path);
    if parts.len() <= last {
        return Err(PrepError::MalformedPath {
            path: abs_path.to_string(),
            source_name: source.to_string(),
            required: last,
            found: parts.len(),
        });
    }
    Ok(parts[first..=last].join("_"))
}

/// Running state of the sequential numbering scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAccumulator {
    current_number: u32,
    current_index: u32,
    last_path: Option<String>,
}

impl RowAccumulator {
    pub fn new(seed: u32) -> Self {
        Self {
            current_number: seed,
            current_index: 0,
            last_path: None,
        }
    }

    /// Numbers the next row. Expects rows sorted (grouped) by path.
    ///
    /// Numbers stop at `u32::MAX`; [`number_rows`] reports that case as an error.
    pub fn step(&mut self, abs_path: &str) -> RowNumbering {
        match self.last_path.as_deref() {
            None => self.current_index = 1,
            Some(last) if last == abs_path => self.current_index += 1,
            Some(_) => {
                self.current_number = self.current_number.saturating_add(1);
                self.current_index = 1;
            }
        }
        if self.last_path.as_deref() != Some(abs_path) {
            self.last_path = Some(abs_path.to_string());
        }
        RowNumbering {
            number: self.current_number,
            index: self.current_index,
        }
    }
}

/// Order-independent equivalent of the sequential scan: `number` is the rank of the
/// row's path in first-appearance order, `index` the row's rank within that path.
///
/// A path that reappears after a different one means the table was not grouped,
/// which would silently split one image into two numbers in the sequential scan.
pub fn number_rows<'a, I>(paths: I, seed: u32) -> Result<Vec<RowNumbering>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: HashMap<&'a str, (u32, u32)> = HashMap::new();
    let mut last: Option<&'a str> = None;
    let mut out = Vec::new();

    for (row, path) in paths.into_iter().enumerate() {
        let next_number = u32::try_from(groups.len())
            .ok()
            .and_then(|offset| seed.checked_add(offset));
        let entry = match groups.entry(path) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let number = next_number.ok_or(PrepError::NumberingOverflow { seed, row })?;
                slot.insert((number, 0))
            }
        };
        if entry.1 > 0 && last != Some(path) {
            return Err(PrepError::UngroupedTable {
                path: path.to_string(),
                row,
            });
        }
        entry.1 += 1;
        out.push(RowNumbering {
            number: entry.0,
            index: entry.1,
        });
        last = Some(path);
    }

    Ok(out)
}

/// Derives label, image name and normalized coordinates for numbered rows.
#[derive(Debug, Clone, Default)]
pub struct AnnotationRowProcessor {
    transformer: CoordinateTransformer,
}

impl AnnotationRowProcessor {
    pub fn new(transformer: CoordinateTransformer) -> Self {
        Self { transformer }
    }

    pub fn enrich(
        &self,
        row: AnnotationRow,
        numbering: RowNumbering,
        image_height: u32,
        image_width: u32,
    ) -> Result<EnrichedAnnotationRow> {
        let image_name = image_name(&row.abs_path, &row.source)?;
        let coordinates = self
            .transformer
            .transform(row.bounding_box(), image_height, image_width)?;
        Ok(EnrichedAnnotationRow {
            label: label_for_finding(&row.finding),
            number: numbering.number,
            index: numbering.index,
            image_name,
            coordinates,
            row,
        })
    }

    /// Sequential form: numbers the row from `acc` and enriches it in one step.
    pub fn step(
        &self,
        acc: &mut RowAccumulator,
        row: AnnotationRow,
        image_height: u32,
        image_width: u32,
    ) -> Result<EnrichedAnnotationRow> {
        let numbering = acc.step(&row.abs_path);
        self.enrich(row, numbering, image_height, image_width)
    }
}
