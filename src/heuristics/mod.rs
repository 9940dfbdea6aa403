//! Rule-based signals: ransom-note filenames and rapid modification bursts.

mod window;

pub use window::ModificationWindow;

use crate::config::HeuristicsConfig;
use std::path::Path;

/// Matches created filenames against extortion-note keywords.
#[derive(Debug, Clone)]
pub struct RansomNoteMatcher {
    keywords: Vec<String>,
}

impl RansomNoteMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// First keyword contained in the uppercased basename, if any.
    pub fn matches(&self, path: &Path) -> Option<&str> {
        let name = path.file_name()?.to_string_lossy().to_uppercase();
        self.keywords
            .iter()
            .find(|k| name.contains(k.as_str()))
            .map(String::as_str)
    }
}

/// Outcome of evaluating a full modification window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RapidModification {
    pub count: usize,
    pub span_secs: f64,
}

/// Fires when a window is exactly full and spans no more than `max_span_secs`.
#[derive(Debug, Clone)]
pub struct RapidModificationDetector {
    capacity: usize,
    max_span_secs: f64,
}

impl RapidModificationDetector {
    pub fn new(capacity: usize, max_span_secs: f64) -> Self {
        Self {
            capacity: capacity.max(1),
            max_span_secs,
        }
    }

    pub fn new_window(&self) -> ModificationWindow {
        ModificationWindow::new(self.capacity)
    }

    pub fn evaluate(&self, window: &ModificationWindow) -> Option<RapidModification> {
        if window.len() != self.capacity {
            return None;
        }
        let span_secs = window.span_secs();
        (span_secs <= self.max_span_secs).then_some(RapidModification {
            count: window.len(),
            span_secs,
        })
    }
}

/// Both heuristics, built from config.
#[derive(Debug, Clone)]
pub struct HeuristicEngine {
    pub ransom_notes: RansomNoteMatcher,
    pub rapid: RapidModificationDetector,
}

impl HeuristicEngine {
    pub fn new(config: &HeuristicsConfig) -> Self {
        Self {
            ransom_notes: RansomNoteMatcher::new(&config.ransom_note_keywords),
            rapid: RapidModificationDetector::new(
                config.modification_track_count,
                config.modification_window_secs,
            ),
        }
    }
}
