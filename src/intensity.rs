//
// intensity.rs
// Mammo-Prep-rs
//
// Window/level values that may be scalar or multi-valued, and the per-device policy for reducing them.
//
// Thales Matheus Mendonça Santos - November 2025

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// A window/level attribute as stored in the file: one number or a short list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntensityValue {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl IntensityValue {
    /// Builds a value from the decoded numbers of a multi-valued element.
    pub fn from_values(attribute: &'static str, values: Vec<f64>) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PrepError::MalformedAttribute {
                attribute,
                reason: format!("non-finite value in {:?}", values),
            });
        }
        match values.len() {
            0 => Err(PrepError::MalformedAttribute {
                attribute,
                reason: "no numeric values".to_string(),
            }),
            1 => Ok(IntensityValue::Scalar(values[0])),
            _ => Ok(IntensityValue::Sequence(values)),
        }
    }

    /// The primary (first) value. Only a hand-built empty sequence has none.
    pub fn primary(&self) -> Option<f64> {
        match self {
            IntensityValue::Scalar(v) => Some(*v),
            IntensityValue::Sequence(values) => values.first().copied(),
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, IntensityValue::Sequence(values) if values.len() > 1)
    }
}

/// How a multi-valued window/level is reduced for a given device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiWindowPolicy {
    /// Use the first window; the remaining vendor presets are ignored.
    Primary,
}

/// Acquisition devices known to ship multi-valued window presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceModel {
    GiottoImage3dl,
    GiottoClass,
    Unlisted,
}

const WINDOW_POLICIES: &[(DeviceModel, MultiWindowPolicy)] = &[
    (DeviceModel::GiottoImage3dl, MultiWindowPolicy::Primary),
    (DeviceModel::GiottoClass, MultiWindowPolicy::Primary),
];

impl DeviceModel {
    pub fn from_model_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("GIOTTO IMAGE 3DL") => DeviceModel::GiottoImage3dl,
            Some("GIOTTO CLASS") => DeviceModel::GiottoClass,
            _ => DeviceModel::Unlisted,
        }
    }

    /// Looks the device up in the policy table. `None` means the device is not known
    /// to carry multiple windows.
    pub fn window_policy(self) -> Option<MultiWindowPolicy> {
        WINDOW_POLICIES
            .iter()
            .find(|(model, _)| *model == self)
            .map(|(_, policy)| *policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_becomes_scalar() {
        let value = IntensityValue::from_values("WindowWidth", vec![400.0]).unwrap();
        assert_eq!(value, IntensityValue::Scalar(400.0));
        assert!(!value.is_multi_valued());
        assert_eq!(value.primary(), Some(400.0));
    }

    #[test]
    fn sequence_reduces_to_first_element() {
        let value = IntensityValue::from_values("WindowCenter", vec![40.0, 80.0]).unwrap();
        assert!(value.is_multi_valued());
        assert_eq!(value.primary(), Some(40.0));
    }

    #[test]
    fn empty_or_nan_values_are_malformed() {
        assert!(matches!(
            IntensityValue::from_values("WindowWidth", vec![]),
            Err(PrepError::MalformedAttribute { .. })
        ));
        assert!(matches!(
            IntensityValue::from_values("WindowWidth", vec![f64::NAN]),
            Err(PrepError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn giotto_models_use_primary_window() {
        let model = DeviceModel::from_model_name(Some("GIOTTO CLASS "));
        assert_eq!(model, DeviceModel::GiottoClass);
        assert_eq!(model.window_policy(), Some(MultiWindowPolicy::Primary));
        assert_eq!(DeviceModel::from_model_name(Some("Selenia Dimensions")).window_policy(), None);
        assert_eq!(DeviceModel::from_model_name(None), DeviceModel::Unlisted);
    }
}
