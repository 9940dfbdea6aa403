//! Optional malicious-activity classifier.
//!
//! The capability is resolved exactly once at startup into an `Option<Classifier>`
//! held by the detector; call sites branch on that instead of re-probing.

mod dataset;
mod logistic;

pub use dataset::Dataset;
pub use logistic::LogisticModel;

use crate::config::ClassifierConfig;
use crate::error::{ClassifierError, DatasetError, DetectorError};
use crate::features::{FeatureVector, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Benign,
    Malicious,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Malicious probability
    pub probability: f64,
}

/// What a prediction should cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Malicious at or above the confidence threshold
    Alert,
    /// Malicious below the threshold: logged only
    LowConfidence,
    Benign,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    model: LogisticModel,
    confidence_threshold: f64,
}

impl Classifier {
    /// Whether this build carries classifier support at all.
    pub fn compiled_in() -> bool {
        cfg!(feature = "classifier")
    }

    pub fn train(dataset_path: &Path, config: &ClassifierConfig) -> Result<Self, DatasetError> {
        if !Self::compiled_in() {
            return Err(DatasetError::Unsupported);
        }
        let data = Dataset::load(dataset_path, &FEATURE_NAMES)?;
        let (benign, malicious) = data.class_counts();
        info!(benign, malicious, "class distribution for training (1=malicious, 0=benign)");
        if benign == 0 || malicious == 0 {
            warn!("training data only contains one class; model may not be effective");
        }
        info!(samples = data.rows(), features = ?data.feature_names, "training classifier");
        let model = LogisticModel::train(&data, config.epochs, config.learning_rate);
        info!(samples = model.samples, "classifier trained");
        Ok(Self::from_model(model, config.confidence_threshold))
    }

    pub fn from_model(model: LogisticModel, confidence_threshold: f64) -> Self {
        Self {
            model,
            confidence_threshold,
        }
    }

    /// Build the classifier if possible. Any failure disables it with a logged
    /// reason; with `required` set the failure is fatal instead.
    pub fn resolve(config: &ClassifierConfig) -> Result<Option<Self>, DetectorError> {
        let outcome = match &config.dataset_path {
            _ if !Self::compiled_in() => Err(DatasetError::Unsupported),
            None => Err(DatasetError::NotProvided),
            Some(path) => Self::train(path, config),
        };
        match outcome {
            Ok(c) => Ok(Some(c)),
            Err(e) if config.required => Err(DetectorError::ClassifierRequired(e.to_string())),
            Err(e) => {
                error!(error = %e, "AI detection disabled; running heuristics only");
                Ok(None)
            }
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    pub fn low_confidence(&self) -> bool {
        self.model.low_confidence
    }

    pub fn model(&self) -> &LogisticModel {
        &self.model
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        let probability = self.model.probability(features.as_slice())?;
        let label = if probability >= 0.5 {
            Label::Malicious
        } else {
            Label::Benign
        };
        Ok(Prediction { label, probability })
    }

    pub fn verdict(&self, prediction: &Prediction) -> Verdict {
        match prediction.label {
            Label::Malicious if prediction.probability >= self.confidence_threshold => {
                Verdict::Alert
            }
            Label::Malicious => Verdict::LowConfidence,
            Label::Benign => Verdict::Benign,
        }
    }
}
