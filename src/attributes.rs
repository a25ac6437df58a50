//
// attributes.rs
// Mammo-Prep-rs
//
// Reads the window/level, photometric and device attributes that drive intensity normalization.
//
// Thales Matheus Mendonça Santos - November 2025

use dicom::core::Tag;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dicom_access::ElementAccess;
use crate::error::{PrepError, Result};
use crate::intensity::{DeviceModel, IntensityValue, MultiWindowPolicy};

pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
pub const PIXEL_PADDING_VALUE: Tag = Tag(0x0028, 0x0120);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);

/// Whether higher samples render darker (MONOCHROME1) or lighter (MONOCHROME2).
/// Anything else is carried verbatim and handled like MONOCHROME2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotometricInterpretation {
    Monochrome1,
    Monochrome2,
    Other(String),
}

impl PhotometricInterpretation {
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("MONOCHROME1") => PhotometricInterpretation::Monochrome1,
            Some("MONOCHROME2") => PhotometricInterpretation::Monochrome2,
            Some(other) => PhotometricInterpretation::Other(other.to_string()),
            None => PhotometricInterpretation::Other("Unknown".to_string()),
        }
    }

    pub fn is_inverted(&self) -> bool {
        matches!(self, PhotometricInterpretation::Monochrome1)
    }
}

/// Resolved scalar window used by the linear stretch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub width: f64,
    pub center: f64,
}

/// Metadata bag for one image, consumed once by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DicomAttributes {
    pub window_width: Option<IntensityValue>,
    pub window_center: Option<IntensityValue>,
    pub photometric_interpretation: PhotometricInterpretation,
    pub manufacturer_model: Option<String>,
    pub pixel_padding_value: Option<f64>,
}

impl Default for DicomAttributes {
    fn default() -> Self {
        Self {
            window_width: None,
            window_center: None,
            photometric_interpretation: PhotometricInterpretation::Monochrome2,
            manufacturer_model: None,
            pixel_padding_value: None,
        }
    }
}

impl DicomAttributes {
    pub fn device_model(&self) -> DeviceModel {
        DeviceModel::from_model_name(self.manufacturer_model.as_deref())
    }

    pub fn padding_value(&self) -> f64 {
        self.pixel_padding_value.unwrap_or(0.0)
    }

    /// Reduces window/level to scalars. `Ok(None)` selects the min–max fallback.
    ///
    /// Multi-valued attributes are reduced to their first element. For devices
    /// outside the policy table this is a warning, or an error when
    /// `strict_devices` is set.
    pub fn resolve_window(&self, strict_devices: bool) -> Result<Option<Window>> {
        let (width, center) = match (&self.window_width, &self.window_center) {
            (Some(width), Some(center)) => (width, center),
            (None, _) => {
                debug!("No WindowWidth attribute, using min-max stretch");
                return Ok(None);
            }
            (Some(_), None) => {
                debug!("WindowWidth without WindowCenter, using min-max stretch");
                return Ok(None);
            }
        };

        for (attribute, value) in [("WindowWidth", width), ("WindowCenter", center)] {
            if !value.is_multi_valued() {
                continue;
            }
            let device = self.device_model();
            match device.window_policy() {
                Some(MultiWindowPolicy::Primary) => {}
                None if strict_devices => {
                    return Err(PrepError::UnsupportedDeviceModel {
                        model: self
                            .manufacturer_model
                            .clone()
                            .unwrap_or_else(|| "Unknown".to_string()),
                        attribute,
                    });
                }
                None => warn!(
                    model = ?self.manufacturer_model,
                    attribute,
                    "Multi-valued attribute on unlisted device, using the primary window"
                ),
            }
        }

        let width = width.primary().ok_or(PrepError::MalformedAttribute {
            attribute: "WindowWidth",
            reason: "empty sequence".to_string(),
        })?;
        let center = center.primary().ok_or(PrepError::MalformedAttribute {
            attribute: "WindowCenter",
            reason: "empty sequence".to_string(),
        })?;

        if width <= 0.0 {
            return Err(PrepError::MalformedAttribute {
                attribute: "WindowWidth",
                reason: format!("width must be positive, got {}", width),
            });
        }

        Ok(Some(Window { width, center }))
    }
}

fn intensity_for_tag<T: ElementAccess>(
    obj: &T,
    tag: Tag,
    attribute: &'static str,
) -> Result<Option<IntensityValue>> {
    match obj.element_floats(tag) {
        None => Ok(None),
        Some(Ok(values)) if values.is_empty() => Ok(None),
        Some(Ok(values)) => IntensityValue::from_values(attribute, values).map(Some),
        Some(Err(reason)) => Err(PrepError::MalformedAttribute { attribute, reason }),
    }
}

pub fn extract_attributes<T: ElementAccess>(obj: &T) -> Result<DicomAttributes> {
    let window_width = intensity_for_tag(obj, WINDOW_WIDTH, "WindowWidth")?;
    let window_center = intensity_for_tag(obj, WINDOW_CENTER, "WindowCenter")?;
    let photometric_interpretation =
        PhotometricInterpretation::from_attribute(obj.element_str(PHOTOMETRIC_INTERPRETATION).as_deref());
    let manufacturer_model = obj
        .element_str(MANUFACTURER_MODEL_NAME)
        .filter(|s| !s.is_empty());
    let pixel_padding_value = intensity_for_tag(obj, PIXEL_PADDING_VALUE, "PixelPaddingValue")?
        .and_then(|v| v.primary());

    Ok(DicomAttributes {
        window_width,
        window_center,
        photometric_interpretation,
        manufacturer_model,
        pixel_padding_value,
    })
}
