//! Error taxonomy. Only [`DetectorError`] is allowed to halt the process; everything
//! else is recovered at the event or file where it happened.

use std::path::PathBuf;
use thiserror::Error;

/// Startup and runtime failures surfaced to `main`.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("monitored directory does not exist: {0}")]
    MissingMonitoredDir(PathBuf),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("classifier is required but unavailable: {0}")]
    ClassifierRequired(String),
    #[error("watcher error: {0}")]
    Watcher(#[from] notify::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dataset problems that disable the classifier.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset path not provided")]
    NotProvided,
    #[error("dataset file not found: {0}")]
    NotFound(PathBuf),
    #[error("missing label column '{0}'")]
    MissingLabel(String),
    #[error("missing feature columns: {0}")]
    MissingFeatures(String),
    #[error("no valid data rows for training")]
    Empty,
    #[error("classifier support not compiled in")]
    Unsupported,
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-prediction failures; the prediction is skipped.
#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("feature mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
}

/// Signal delivery failures, mapped to non-fatal block outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessControlError {
    #[error("process {0} not found")]
    NotFound(u32),
    #[error("access denied for process {0}")]
    AccessDenied(u32),
    #[error("signal to process {pid} failed: {detail}")]
    Signal { pid: u32, detail: String },
}
