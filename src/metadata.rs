use std::path::Path;

use anyhow::{Context, Result};
use dicom::object::{open_file, DefaultDicomObject};

use crate::attributes::{extract_attributes, COLUMNS, ROWS};
use crate::dicom_access::ElementAccess;
use crate::intensity::IntensityValue;
use crate::models::AttributeSummary;

fn dimension<T: ElementAccess>(obj: &T, tag: dicom::core::Tag) -> u32 {
    obj.element_floats(tag)
        .and_then(|v| v.ok())
        .and_then(|v| v.first().copied())
        .map_or(0, |v| v as u32)
}

fn values(value: &Option<IntensityValue>) -> Option<Vec<f64>> {
    value.as_ref().map(|v| match v {
        IntensityValue::Scalar(x) => vec![*x],
        IntensityValue::Sequence(xs) => xs.clone(),
    })
}

pub fn summarize<T: ElementAccess>(obj: &T, strict_devices: bool) -> Result<AttributeSummary> {
    let attrs = extract_attributes(obj)?;
    let resolved_window = attrs
        .resolve_window(strict_devices)?
        .map(|w| (w.width, w.center));

    Ok(AttributeSummary {
        rows: dimension(obj, ROWS),
        columns: dimension(obj, COLUMNS),
        photometric_interpretation: format!("{:?}", attrs.photometric_interpretation),
        manufacturer_model: attrs.manufacturer_model.clone(),
        device_model: format!("{:?}", attrs.device_model()),
        window_width: values(&attrs.window_width),
        window_center: values(&attrs.window_center),
        resolved_window,
        pixel_padding_value: attrs.padding_value(),
    })
}

pub fn read_summary(path: &Path, strict_devices: bool) -> Result<AttributeSummary> {
    let obj: DefaultDicomObject = open_file(path).context("Failed to open DICOM file")?;
    summarize(&obj, strict_devices)
}

pub fn print_info(path: &Path, strict_devices: bool, as_json: bool) -> Result<()> {
    let summary = read_summary(path, strict_devices)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "=".repeat(80));
    println!("Normalization inputs: {}", path.display());
    println!("{}", "=".repeat(80));
    println!("  Size:        {} x {}", summary.rows, summary.columns);
    println!("  Photometric: {}", summary.photometric_interpretation);
    println!(
        "  Model:       {} ({})",
        summary.manufacturer_model.as_deref().unwrap_or("N/A"),
        summary.device_model
    );
    println!("  Padding:     {}", summary.pixel_padding_value);
    match summary.resolved_window {
        Some((width, center)) => println!(
            "  Window:      width {} center {} (stored {:?} / {:?})",
            width, center, summary.window_width, summary.window_center
        ),
        None => println!("  Window:      none, min-max stretch"),
    }

    Ok(())
}
