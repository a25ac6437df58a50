use dicom::core::Tag;
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{DefaultDicomObject, InMemDicomObject};

/// Small helper trait to pull string and numeric values from different DICOM object shapes.
pub trait ElementAccess {
    fn element_str(&self, tag: Tag) -> Option<String>;
    /// `None` when the element is absent, `Some(Err)` when present but not numeric.
    fn element_floats(&self, tag: Tag) -> Option<Result<Vec<f64>, String>>;
}

impl ElementAccess for DefaultDicomObject {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
    }

    fn element_floats(&self, tag: Tag) -> Option<Result<Vec<f64>, String>> {
        self.element(tag)
            .ok()
            .map(|e| e.to_multi_float64().map_err(|err| err.to_string()))
    }
}

impl ElementAccess for InMemDicomObject<StandardDataDictionary> {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
    }

    fn element_floats(&self, tag: Tag) -> Option<Result<Vec<f64>, String>> {
        self.element(tag)
            .ok()
            .map(|e| e.to_multi_float64().map_err(|err| err.to_string()))
    }
}
