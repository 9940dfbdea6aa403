//! CSV training data: one binary label column plus the fixed feature columns.

use crate::error::DatasetError;
use crate::features::LABEL_COLUMN;
use ndarray::{Array1, Array2};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    /// rows × features
    pub features: Array2<f64>,
    /// 1 = malicious, 0 = benign (inverted from the file's `Benign` column)
    pub labels: Array1<f64>,
    /// Rows dropped for a missing or non-binary label
    pub skipped_rows: usize,
}

impl Dataset {
    pub fn load(path: &Path, feature_names: &[&str]) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let headers = rdr.headers()?.clone();
        info!(columns = ?headers.iter().collect::<Vec<_>>(), "dataset loaded");

        let label_idx = headers
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .ok_or_else(|| DatasetError::MissingLabel(LABEL_COLUMN.to_string()))?;

        let mut feature_idx = Vec::with_capacity(feature_names.len());
        let mut missing = Vec::new();
        for name in feature_names {
            match headers.iter().position(|h| h == *name) {
                Some(i) => feature_idx.push(i),
                None => missing.push(*name),
            }
        }
        if !missing.is_empty() {
            return Err(DatasetError::MissingFeatures(missing.join(", ")));
        }

        let mut flat: Vec<f64> = Vec::new();
        let mut labels: Vec<f64> = Vec::new();
        let mut skipped_rows = 0usize;
        for (line, record) in rdr.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!(row = line + 1, error = %e, "unreadable dataset row skipped");
                    skipped_rows += 1;
                    continue;
                }
            };
            let benign = match record.get(label_idx).and_then(|v| v.parse::<f64>().ok()) {
                Some(v) if v == 0.0 || v == 1.0 => v,
                _ => {
                    skipped_rows += 1;
                    continue;
                }
            };
            labels.push(1.0 - benign);
            flat.extend(feature_idx.iter().map(|&i| parse_cell(record.get(i))));
        }

        if labels.is_empty() {
            return Err(DatasetError::Empty);
        }
        if skipped_rows > 0 {
            warn!(skipped_rows, "dataset rows without a usable label were skipped");
        }

        let cols = feature_idx.len();
        let features = Array2::from_shape_fn((labels.len(), cols), |(r, c)| flat[r * cols + c]);
        Ok(Self {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            features,
            labels: Array1::from(labels),
            skipped_rows,
        })
    }

    pub fn rows(&self) -> usize {
        self.labels.len()
    }

    /// (benign, malicious) row counts
    pub fn class_counts(&self) -> (usize, usize) {
        let malicious = self.labels.iter().filter(|&&y| y > 0.5).count();
        (self.rows() - malicious, malicious)
    }
}

/// Missing, empty, or non-numeric cells count as 0.
fn parse_cell(cell: Option<&str>) -> f64 {
    cell.and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
