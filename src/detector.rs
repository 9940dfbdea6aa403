//! Detection engine: per-event analysis over shared windows and suppression state.

use crate::alerts::{AlertCoordinator, AlertResponse, Severity};
use crate::config::{DetectorConfig, ResolvedPaths};
use crate::cooldown::ExpiringSet;
use crate::events::{FileEvent, FileEventKind, PathFilter};
use crate::features::extract_features;
use crate::heuristics::{HeuristicEngine, ModificationWindow};
use crate::model::{Classifier, Prediction, Verdict};
use crate::response::{BackupManager, ProcessBlocker, ProcessTable};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Windows and alerted paths share one lock.
struct EngineState {
    windows: HashMap<PathBuf, ModificationWindow>,
    alerted: ExpiringSet<PathBuf>,
}

/// What handling one event produced.
#[derive(Debug, Default, Serialize)]
pub struct EventReport {
    pub alerts: Vec<AlertResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    /// Modify ignored because the path is inside its suppression window
    pub suppressed: bool,
    pub periodic_backup: bool,
}

pub struct Detector {
    filter: PathFilter,
    heuristics: HeuristicEngine,
    classifier: Option<Classifier>,
    state: Mutex<EngineState>,
    coordinator: AlertCoordinator,
    backups: Arc<BackupManager>,
    pid: u32,
}

impl Detector {
    /// `table` backs the process blocker; it is unused when blocking is disabled.
    pub fn new(
        config: &DetectorConfig,
        paths: &ResolvedPaths,
        classifier: Option<Classifier>,
        table: Box<dyn ProcessTable>,
    ) -> std::io::Result<Self> {
        let backups = Arc::new(BackupManager::new(
            paths,
            Duration::from_secs(config.backup.interval_secs),
        )?);
        let blocker = config.blocker.enabled.then(|| {
            ProcessBlocker::new(
                table,
                &config.blocker.interpreter_markers,
                Duration::from_secs(config.blocker.cooldown_secs),
                Duration::from_millis(config.blocker.stage_timeout_ms),
            )
        });
        let coordinator = AlertCoordinator::new(
            blocker,
            Arc::clone(&backups),
            paths.log_file.clone(),
            config.alerts.console_banner,
        );

        match &classifier {
            Some(c) if c.low_confidence() => {
                warn!("classifier enabled but trained on a single class")
            }
            Some(_) => info!("classifier enabled"),
            None => info!("classifier disabled; heuristics only"),
        }

        Ok(Self {
            filter: PathFilter::new(paths),
            heuristics: HeuristicEngine::new(&config.heuristics),
            classifier,
            state: Mutex::new(EngineState {
                windows: HashMap::new(),
                alerted: ExpiringSet::new(Duration::from_secs(config.alerts.suppression_secs)),
            }),
            coordinator,
            backups,
            pid: std::process::id(),
        })
    }

    pub fn backups(&self) -> &Arc<BackupManager> {
        &self.backups
    }

    pub fn classifier(&self) -> Option<&Classifier> {
        self.classifier.as_ref()
    }

    pub fn blocker(&self) -> Option<&ProcessBlocker> {
        self.coordinator.blocker()
    }

    pub fn window_len(&self, path: &Path) -> usize {
        self.state.lock().windows.get(path).map_or(0, |w| w.len())
    }

    pub fn is_alerted(&self, path: &Path, now: DateTime<Utc>) -> bool {
        self.state.lock().alerted.contains(&path.to_path_buf(), now)
    }

    /// Drop expired suppression and cooldown entries.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let alerted = self.state.lock().alerted.sweep(now);
        let cooled = self.blocker().map_or(0, |b| b.sweep(now));
        if alerted + cooled > 0 {
            debug!(alerted, cooled, "expired entries removed");
        }
    }

    pub fn handle(&self, event: &FileEvent) -> EventReport {
        let path = event.path.as_path();
        match event.kind {
            FileEventKind::Delete => {
                info!(path = %path.display(), "file deleted");
                EventReport::default()
            }
            FileEventKind::Rename => {
                let from = event
                    .old_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "?".to_string());
                info!(from = %from, to = %path.display(), "file moved");
                if self.filter.is_monitored(path) {
                    self.analyze(event)
                } else {
                    EventReport::default()
                }
            }
            FileEventKind::Create => {
                info!(path = %path.display(), "file created");
                self.analyze(event)
            }
            FileEventKind::Modify => {
                if self.is_alerted(path, event.timestamp) {
                    debug!(path = %path.display(), "ignoring modification for recently alerted file");
                    return EventReport {
                        suppressed: true,
                        ..EventReport::default()
                    };
                }
                info!(path = %path.display(), "file modified");
                self.analyze(event)
            }
        }
    }

    fn analyze(&self, event: &FileEvent) -> EventReport {
        let now = event.timestamp;
        let path = event.path.as_path();
        let mut report = EventReport::default();

        if event.kind == FileEventKind::Create {
            if let Some(keyword) = self.heuristics.ransom_notes.matches(path) {
                let reason = format!(
                    "Ransom note created: File={} Keyword={} DetectorPID={}",
                    path.display(),
                    keyword,
                    self.pid
                );
                report
                    .alerts
                    .push(self.coordinator.trigger(reason, Severity::Critical, path, true, now));
            }
        }

        let window = {
            let mut state = self.state.lock();
            if event.kind == FileEventKind::Modify {
                let w = state
                    .windows
                    .entry(path.to_path_buf())
                    .or_insert_with(|| self.heuristics.rapid.new_window());
                w.push(now);
                Some(w.clone())
            } else {
                state.windows.get(path).cloned()
            }
        };

        if event.kind == FileEventKind::Modify {
            if let Some(hit) = window.as_ref().and_then(|w| self.heuristics.rapid.evaluate(w)) {
                let reason = format!(
                    "Rapid modification detected: File={} Count={} Window={:.2}s DetectorPID={}",
                    path.display(),
                    hit.count,
                    hit.span_secs,
                    self.pid
                );
                report
                    .alerts
                    .push(self.coordinator.trigger(reason, Severity::Warning, path, true, now));
            }
        }

        if let Some(classifier) = &self.classifier {
            let prediction = self.classify(classifier, event, window.as_ref(), &mut report);
            report.prediction = prediction;
        }

        if !report.alerts.is_empty() {
            self.state.lock().alerted.insert(path.to_path_buf(), now);
        }

        if self.backups.is_due(now) && !self.backups.is_running() {
            report.periodic_backup = self.backups.spawn("periodic").is_some();
        }
        report
    }

    fn classify(
        &self,
        classifier: &Classifier,
        event: &FileEvent,
        window: Option<&ModificationWindow>,
        report: &mut EventReport,
    ) -> Option<Prediction> {
        let path = event.path.as_path();
        let features = extract_features(&event.id, path, window, classifier.feature_names());
        let prediction = match classifier.predict(&features) {
            Ok(p) => p,
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping AI prediction");
                return None;
            }
        };
        info!(
            probability = prediction.probability,
            prediction = ?prediction.label,
            path = %path.display(),
            pid = self.pid,
            "[AI_DETECT]"
        );
        match classifier.verdict(&prediction) {
            Verdict::Alert => {
                let reason = format!(
                    "AI detected high confidence malicious activity (Prob={:.4}): File={} DetectorPID={}",
                    prediction.probability,
                    path.display(),
                    self.pid
                );
                report.alerts.push(self.coordinator.trigger(
                    reason,
                    Severity::Critical,
                    path,
                    true,
                    event.timestamp,
                ));
            }
            Verdict::LowConfidence => warn!(
                probability = prediction.probability,
                path = %path.display(),
                "AI detected low confidence malicious activity"
            ),
            Verdict::Benign => {}
        }
        Some(prediction)
    }
}
