//! Annotation table reader and writer.
//!
//! The input table has the columns `AbsPath, Source, Type, xmin, ymin, xmax, ymax, id`,
//! sorted by `AbsPath`. The enriched table repeats them and appends
//! `Number, Index, Label, ImageName, pixy, pixx`, the target-canvas box
//! (`xmin1080 .. h1080`) and the normalized corner/center forms (`x1 .. nh`).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::annotations::{AnnotationRow, EnrichedAnnotationRow};
use crate::error::{PrepError, Result};

/// Flat row layout of the enriched table.
#[derive(Debug, Serialize)]
struct EnrichedRecord<'a> {
    #[serde(rename = "AbsPath")]
    abs_path: &'a str,
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Type")]
    finding: &'a str,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    id: &'a str,
    #[serde(rename = "Number")]
    number: u32,
    #[serde(rename = "Index")]
    index: u32,
    #[serde(rename = "Label")]
    label: u8,
    #[serde(rename = "ImageName")]
    image_name: &'a str,
    pixy: u32,
    pixx: u32,
    xmin1080: f64,
    ymin1080: f64,
    xmax1080: f64,
    ymax1080: f64,
    w1080: f64,
    h1080: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    cx: f64,
    cy: f64,
    nw: f64,
    nh: f64,
}

impl<'a> From<&'a EnrichedAnnotationRow> for EnrichedRecord<'a> {
    fn from(enriched: &'a EnrichedAnnotationRow) -> Self {
        let row = &enriched.row;
        let c = &enriched.coordinates;
        Self {
            abs_path: &row.abs_path,
            source: row.source.to_string(),
            finding: &row.finding,
            xmin: row.xmin,
            ymin: row.ymin,
            xmax: row.xmax,
            ymax: row.ymax,
            id: &row.id,
            number: enriched.number,
            index: enriched.index,
            label: enriched.label,
            image_name: &enriched.image_name,
            pixy: c.pix_height,
            pixx: c.pix_width,
            xmin1080: c.xmin1080,
            ymin1080: c.ymin1080,
            xmax1080: c.xmax1080,
            ymax1080: c.ymax1080,
            w1080: c.w1080,
            h1080: c.h1080,
            x1: c.x1,
            y1: c.y1,
            x2: c.x2,
            y2: c.y2,
            cx: c.cx,
            cy: c.cy,
            nw: c.nw,
            nh: c.nh,
        }
    }
}

pub fn read_annotations(path: &Path) -> Result<Vec<AnnotationRow>> {
    let file = File::open(path).map_err(|source| PrepError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: AnnotationRow = result.map_err(|source| PrepError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_enriched(path: &Path, rows: &[EnrichedAnnotationRow]) -> Result<()> {
    let file = File::create(path).map_err(|source| PrepError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for row in rows {
        writer
            .serialize(EnrichedRecord::from(row))
            .map_err(|source| PrepError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
    }
    writer
        .into_inner()
        .map_err(|e| PrepError::Io {
            path: path.to_path_buf(),
            source: e.into_error(),
        })?
        .flush()
        .map_err(|source| PrepError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads an enriched table back as `(AbsPath, ImageName, Number)` triples for image export.
pub fn read_enriched_images(path: &Path) -> Result<Vec<(String, String, u32)>> {
    #[derive(serde::Deserialize)]
    struct ImageColumns {
        #[serde(rename = "AbsPath")]
        abs_path: String,
        #[serde(rename = "ImageName")]
        image_name: String,
        #[serde(rename = "Number")]
        number: u32,
    }

    let file = File::open(path).map_err(|source| PrepError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let mut images = Vec::new();
    for result in reader.deserialize() {
        let row: ImageColumns = result.map_err(|source| PrepError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        images.push((row.abs_path, row.image_name, row.number));
    }
    Ok(images)
}
