//
// source.rs
// Mammo-Prep-rs
//
// Opens DICOM or raster inputs, probes their dimensions and produces the square training image.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fmt::Display;
use std::path::Path;

use dicom::object::{open_file, DefaultDicomObject};
use dicom::pixeldata::PixelDecoder;
use dicom_pixeldata::{ConvertOptions, ModalityLutOption};
use ndarray::{Array3, ArrayD, Axis, Ix3};
use tracing::debug;

use crate::attributes::{extract_attributes, DicomAttributes, COLUMNS, ROWS};
use crate::backend::PixelBackend;
use crate::buffers::{NormalizedImageBuffer, RawImageBuffer, SquareImageBuffer};
use crate::dicom_access::ElementAccess;
use crate::error::{PrepError, Result};
use crate::normalize::IntensityNormalizer;
use crate::pad::pad_to_square;

/// A decoded input, either DICOM samples awaiting normalization or an 8-bit raster.
#[derive(Debug, Clone)]
pub enum SourceImage {
    Dicom {
        pixels: RawImageBuffer,
        attrs: DicomAttributes,
    },
    Raster(NormalizedImageBuffer),
}

fn decode_error(path: &Path, err: impl Display) -> PrepError {
    PrepError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

pub fn is_dicom_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom")
        })
}

fn open_dicom(path: &Path) -> Result<DefaultDicomObject> {
    open_file(path).map_err(|e| decode_error(path, e))
}

/// Source dimensions as `(height, width)`, read from headers only.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32)> {
    if is_dicom_path(path) {
        let obj = open_dicom(path)?;
        let read = |tag, name: &str| -> Result<u32> {
            obj.element_floats(tag)
                .and_then(|values| values.ok())
                .and_then(|values| values.first().copied())
                .filter(|v| *v >= 1.0)
                .map(|v| v as u32)
                .ok_or_else(|| decode_error(path, format!("missing or invalid {} attribute", name)))
        };
        Ok((read(ROWS, "Rows")?, read(COLUMNS, "Columns")?))
    } else {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok((height, width))
    }
}

fn first_frame(array: ArrayD<f32>) -> std::result::Result<Array3<f32>, ndarray::ShapeError> {
    match array.ndim() {
        4 => array.index_axis_move(Axis(0), 0).into_dimensionality::<Ix3>(),
        2 => array.insert_axis(Axis(2)).into_dimensionality::<Ix3>(),
        _ => array.into_dimensionality::<Ix3>(),
    }
}

/// Decodes the first frame as stored values (no modality rescale) plus its attributes.
pub fn load_dicom(path: &Path) -> Result<(RawImageBuffer, DicomAttributes)> {
    let obj = open_dicom(path)?;
    let attrs = extract_attributes(&obj)?;

    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| decode_error(path, e))?;
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let array = decoded
        .to_ndarray_with_options::<f32>(&options)
        .map_err(|e| decode_error(path, e))?
        .into_dyn();
    let frame = first_frame(array).map_err(|e| decode_error(path, e))?;
    debug!(path = %path.display(), shape = ?frame.dim(), "Decoded DICOM frame");

    Ok((RawImageBuffer::new(frame)?, attrs))
}

pub fn load(path: &Path) -> Result<SourceImage> {
    if is_dicom_path(path) {
        let (pixels, attrs) = load_dicom(path)?;
        Ok(SourceImage::Dicom { pixels, attrs })
    } else {
        let image = image::open(path).map_err(|e| decode_error(path, e))?;
        Ok(SourceImage::Raster(NormalizedImageBuffer::from_dynamic_image(&image)?))
    }
}

/// Open, normalize and letterbox one input file.
pub fn prepare_training_image<B: PixelBackend>(
    path: &Path,
    normalizer: &IntensityNormalizer<B>,
) -> Result<SquareImageBuffer> {
    let normalized = match load(path)? {
        SourceImage::Dicom { pixels, attrs } => normalizer.normalize(pixels, &attrs)?,
        SourceImage::Raster(image) => image,
    };
    Ok(pad_to_square(&normalized))
}
