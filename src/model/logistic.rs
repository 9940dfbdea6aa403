//! Class-balanced logistic regression over standardized features.
//! Input: one row of `feature_names.len()` f64, output: malicious probability.

use super::dataset::Dataset;
use crate::error::ClassifierError;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub samples: usize,
    /// Trained on a single class; predictions mirror that class
    pub low_confidence: bool,
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

impl LogisticModel {
    /// Full-batch gradient descent; deterministic for a given dataset.
    pub fn train(data: &Dataset, epochs: usize, learning_rate: f64) -> Self {
        let x = &data.features;
        let y = &data.labels;
        let (rows, cols) = x.dim();

        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(cols));
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let xs = (x - &mean) / &scale;

        let (benign, malicious) = data.class_counts();
        let class_weight = |count: usize| {
            if benign == 0 || malicious == 0 {
                1.0
            } else {
                rows as f64 / (2.0 * count as f64)
            }
        };
        let (w_benign, w_malicious) = (class_weight(benign), class_weight(malicious));
        let sample_w = y.mapv(|yi| if yi > 0.5 { w_malicious } else { w_benign });
        let total_w = sample_w.sum().max(f64::EPSILON);

        let mut weights = Array1::<f64>::zeros(cols);
        let mut bias = 0.0f64;
        for _ in 0..epochs {
            let p = (xs.dot(&weights) + bias).mapv(sigmoid);
            let err = (&p - y) * &sample_w;
            let grad_w = xs.t().dot(&err) / total_w;
            let grad_b = err.sum() / total_w;
            weights.scaled_add(-learning_rate, &grad_w);
            bias -= learning_rate * grad_b;
        }

        Self {
            feature_names: data.feature_names.clone(),
            mean: mean.to_vec(),
            scale: scale.to_vec(),
            weights: weights.to_vec(),
            bias,
            samples: rows,
            low_confidence: benign == 0 || malicious == 0,
        }
    }

    /// Malicious probability in [0, 1].
    pub fn probability(&self, values: &[f64]) -> Result<f64, ClassifierError> {
        if values.len() != self.weights.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.weights.len(),
                got: values.len(),
            });
        }
        let z: f64 = values
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .zip(&self.weights)
            .map(|(((v, m), s), w)| w * (v - m) / s)
            .sum::<f64>()
            + self.bias;
        Ok(sigmoid(z).clamp(0.0, 1.0))
    }
}
