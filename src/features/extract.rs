//! Approximate feature extraction from a file path and its modification window.
//!
//! Only three named signals are ever filled (`file_size`, `mod_freq`,
//! `is_executable`); every other position stays 0. With the PE-header schema the
//! classifier trains on this means an all-zero vector.

use super::FeatureVector;
use crate::heuristics::ModificationWindow;
use std::path::Path;
use tracing::debug;

pub const EXECUTABLE_EXTENSIONS: [&str; 5] = ["exe", "dll", "bat", "scr", "com"];

pub fn extract_features(
    event_id: &str,
    path: &Path,
    window: Option<&ModificationWindow>,
    feature_names: &[String],
) -> FeatureVector {
    let mut values = vec![0.0f64; feature_names.len()];

    for (idx, name) in feature_names.iter().enumerate() {
        values[idx] = match name.as_str() {
            "file_size" => match std::fs::metadata(path) {
                Ok(m) => m.len() as f64,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "file size unavailable");
                    0.0
                }
            },
            "mod_freq" => window.map(mod_frequency).unwrap_or(0.0),
            "is_executable" => {
                if is_executable(path) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
    }

    FeatureVector {
        values,
        event_id: event_id.to_string(),
    }
}

/// Modifications per second over the window; 0 for one entry or zero span.
fn mod_frequency(window: &ModificationWindow) -> f64 {
    let span = window.span_secs();
    if window.len() > 1 && span > 0.0 {
        window.len() as f64 / span
    } else {
        0.0
    }
}

fn is_executable(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| EXECUTABLE_EXTENSIONS.contains(&e.as_str()))
}
