//! Feature vectors submitted to the classifier.

mod extract;

pub use extract::{extract_features, EXECUTABLE_EXTENSIONS};

use serde::{Deserialize, Serialize};

/// Feature columns the classifier is trained on, in order.
pub const FEATURE_NAMES: [&str; 9] = [
    "DebugSize",
    "MajorImageVersion",
    "MajorOSVersion",
    "ExportSize",
    "IatVRA",
    "NumberOfSections",
    "SizeOfStackReserve",
    "DllCharacteristics",
    "ResourceSize",
];

/// Dataset column holding 1 for benign rows, 0 for malicious ones.
pub const LABEL_COLUMN: &str = "Benign";

/// Fixed-order numeric vector aligned to a model's feature names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub event_id: String,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
