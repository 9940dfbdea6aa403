//! Detector configuration. JSON on disk, CLI overrides on top, defaults otherwise.

use crate::error::DetectorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the sibling directory holding timestamped snapshots.
pub const BACKUP_DIR_NAME: &str = "_detector_backups";
pub const DEFAULT_LOG_FILE: &str = "ransomware_detection.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Monitored tree, backup root and log file
    pub monitor: MonitorConfig,
    /// Ransom-note keywords and rapid-modification window
    pub heuristics: HeuristicsConfig,
    /// Optional trained classifier
    pub classifier: ClassifierConfig,
    /// Alert suppression
    pub alerts: AlertConfig,
    /// Process blocking
    pub blocker: BlockerConfig,
    /// Backup scheduling
    pub backup: BackupConfig,
    /// Logging
    pub log: LogConfig,
    /// Pid file and other runtime state
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub root: PathBuf,
    /// Defaults to `<parent of root>/_detector_backups`
    pub backup_root: Option<PathBuf>,
    /// Capacity of the watcher → processing loop queue
    pub queue_capacity: usize,
    /// How often the processing loop wakes to sweep expired entries (ms)
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    pub ransom_note_keywords: Vec<String>,
    /// Window capacity K
    pub modification_track_count: usize,
    /// Max span (seconds) between oldest and newest entry of a full window
    pub modification_window_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub dataset_path: Option<PathBuf>,
    /// Exit at startup if the classifier cannot be built
    pub required: bool,
    /// Malicious probability at or above this escalates to Critical
    pub confidence_threshold: f64,
    pub epochs: usize,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub suppression_secs: u64,
    /// Print a framed banner to stdout for every alert
    pub console_banner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockerConfig {
    pub enabled: bool,
    /// Substrings (case-insensitive) of process names treated as block candidates
    pub interpreter_markers: Vec<String>,
    pub cooldown_secs: u64,
    /// Wait after each of terminate and kill (ms)
    pub stage_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub interval_secs: u64,
    pub initial_backup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    pub file: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            heuristics: HeuristicsConfig::default(),
            classifier: ClassifierConfig::default(),
            alerts: AlertConfig::default(),
            blocker: BlockerConfig::default(),
            backup: BackupConfig::default(),
            log: LogConfig::default(),
            state_dir: PathBuf::from(".ransom-guard"),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("monitored_documents"),
            backup_root: None,
            queue_capacity: 1024,
            sweep_interval_ms: 500,
        }
    }
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            ransom_note_keywords: [
                "DECRYPT",
                "RANSOM",
                "RECOVER",
                "README",
                "HELP",
                "INSTRUCTION",
                "_RECOVERY_",
                "RESTORE",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            modification_track_count: 15,
            modification_window_secs: 10.0,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            required: false,
            confidence_threshold: 0.80,
            epochs: 500,
            learning_rate: 0.1,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            suppression_secs: 60,
            console_banner: true,
        }
    }
}

impl Default for BlockerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interpreter_markers: vec!["python".to_string()],
            cooldown_secs: 300,
            stage_timeout_ms: 1000,
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            initial_backup: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Absolute paths the detector works with, derived once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub backup_root: PathBuf,
    pub log_file: PathBuf,
}

impl DetectorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<DetectorConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        eprintln!("ignoring malformed config {}: {}", path.display(), e)
                    }
                },
                Err(e) => eprintln!("cannot read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Canonicalize the monitored root and derive backup root and log path.
    /// Fails if the root is not an existing directory.
    pub fn resolve(&self) -> Result<ResolvedPaths, DetectorError> {
        if !self.monitor.root.is_dir() {
            return Err(DetectorError::MissingMonitoredDir(self.monitor.root.clone()));
        }
        let root = self.monitor.root.canonicalize()?;
        let backup_root = match &self.monitor.backup_root {
            Some(p) => absolutize(p)?,
            None => root
                .parent()
                .map(|p| p.join(BACKUP_DIR_NAME))
                .ok_or_else(|| {
                    DetectorError::Config(format!(
                        "monitored root {} has no parent for backups",
                        root.display()
                    ))
                })?,
        };
        if root.starts_with(&backup_root) {
            return Err(DetectorError::Config(format!(
                "monitored root {} lies inside backup root {}",
                root.display(),
                backup_root.display()
            )));
        }
        Ok(ResolvedPaths {
            root,
            backup_root,
            log_file: absolutize(&self.log.file)?,
        })
    }
}

/// Join relative paths onto the current dir, canonicalizing the parent when it exists
/// so that comparisons against watcher paths line up.
pub fn absolutize(p: &Path) -> std::io::Result<PathBuf> {
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    match (abs.parent(), abs.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(parent.canonicalize()?.join(name)),
        _ => Ok(abs),
    }
}
