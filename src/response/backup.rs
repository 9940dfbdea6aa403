//! Mutually-exclusive snapshot of the monitored tree into a timestamped directory.

use crate::config::ResolvedPaths;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    Completed,
    /// The destination directory could not be created
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRun {
    pub id: String,
    pub destination: PathBuf,
    pub started_at: DateTime<Utc>,
    pub files_copied: u64,
    pub files_skipped: u64,
    pub dirs_created: u64,
    pub duration_secs: f64,
    pub status: BackupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum BackupOutcome {
    /// Another run held the lock; nothing was done
    Skipped,
    Finished(BackupRun),
}

impl BackupOutcome {
    pub fn run(&self) -> Option<&BackupRun> {
        match self {
            BackupOutcome::Finished(run) => Some(run),
            BackupOutcome::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, BackupOutcome::Skipped)
    }
}

pub struct BackupManager {
    source: PathBuf,
    backup_root: PathBuf,
    log_file: PathBuf,
    interval: ChronoDuration,
    running: Mutex<()>,
    /// Millis since epoch of the last completed run; 0 = never
    last_success_ms: AtomicI64,
}

/// Exclusive right to run one backup; the lock is released on drop.
pub struct BackupSession<'a> {
    manager: &'a BackupManager,
    _guard: MutexGuard<'a, ()>,
}

impl BackupManager {
    /// Creates the backup root if missing.
    pub fn new(paths: &ResolvedPaths, interval: std::time::Duration) -> std::io::Result<Self> {
        std::fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            source: paths.root.clone(),
            backup_root: paths.backup_root.clone(),
            log_file: paths.log_file.clone(),
            interval: ChronoDuration::from_std(interval)
                .unwrap_or_else(|_| ChronoDuration::days(36_500)),
            running: Mutex::new(()),
            last_success_ms: AtomicI64::new(0),
        })
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Non-blocking: `None` while another run is active.
    pub fn try_begin(&self) -> Option<BackupSession<'_>> {
        self.running.try_lock().map(|guard| BackupSession {
            manager: self,
            _guard: guard,
        })
    }

    /// Run a backup now, or skip immediately if one is in progress.
    pub fn backup(&self) -> BackupOutcome {
        match self.try_begin() {
            Some(session) => BackupOutcome::Finished(session.run()),
            None => {
                warn!("backup already in progress, skipping");
                BackupOutcome::Skipped
            }
        }
    }

    /// Run a backup on a background thread. Callers never wait on it.
    pub fn spawn(self: &Arc<Self>, trigger: &'static str) -> Option<JoinHandle<BackupOutcome>> {
        let manager = Arc::clone(self);
        info!(trigger, "dispatching backup");
        match std::thread::Builder::new()
            .name(format!("backup-{trigger}"))
            .spawn(move || manager.backup())
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(trigger, error = %e, "could not start backup thread");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_locked()
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        match self.last_success_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        }
    }

    /// True when no backup has completed yet or the last one is older than the interval.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_success() {
            None => true,
            Some(last) => now - last > self.interval,
        }
    }

    fn mark_success(&self, at: DateTime<Utc>) {
        self.last_success_ms
            .store(at.timestamp_millis().max(1), Ordering::Relaxed);
    }
}

impl BackupSession<'_> {
    /// Mirror the tree. Per-entry failures are logged and counted as skipped.
    pub fn run(self) -> BackupRun {
        let m = self.manager;
        let clock = Instant::now();
        let started_at = Utc::now();
        let id = format!("backup_{}", started_at.format("%Y%m%d_%H%M%S_%3f"));
        let destination = m.backup_root.join(&id);
        let mut run = BackupRun {
            id,
            destination: destination.clone(),
            started_at,
            files_copied: 0,
            files_skipped: 0,
            dirs_created: 0,
            duration_secs: 0.0,
            status: BackupStatus::Completed,
            error: None,
        };

        info!(target_dir = %destination.display(), "[BACKUP_START]");
        if let Err(e) = std::fs::create_dir_all(&destination) {
            error!(target_dir = %destination.display(), error = %e, "general backup error");
            run.status = BackupStatus::Failed;
            run.error = Some(e.to_string());
            run.duration_secs = clock.elapsed().as_secs_f64();
            return run;
        }

        let backup_root = m.backup_root.clone();
        let walker = WalkDir::new(&m.source)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| !e.path().starts_with(&backup_root));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    error!(error = %e, "cannot read entry during backup");
                    run.files_skipped += 1;
                    continue;
                }
            };
            let Ok(rel) = entry.path().strip_prefix(&m.source) else {
                continue;
            };
            let target = destination.join(rel);

            if entry.file_type().is_dir() {
                if rel.as_os_str().is_empty() || target.exists() {
                    continue;
                }
                match std::fs::create_dir_all(&target) {
                    Ok(()) => run.dirs_created += 1,
                    Err(e) => {
                        error!(dir = %target.display(), error = %e, "error creating backup directory")
                    }
                }
                continue;
            }

            if entry.path() == m.log_file {
                run.files_skipped += 1;
                continue;
            }
            match std::fs::copy(entry.path(), &target) {
                Ok(_) => run.files_copied += 1,
                Err(e) => {
                    error!(
                        src = %entry.path().display(),
                        dst = %target.display(),
                        error = %e,
                        "error copying file"
                    );
                    run.files_skipped += 1;
                }
            }
        }

        run.duration_secs = clock.elapsed().as_secs_f64();
        info!(
            duration_secs = run.duration_secs,
            copied_files = run.files_copied,
            copied_dirs = run.dirs_created,
            skipped = run.files_skipped,
            target_dir = %destination.display(),
            "[BACKUP_END]"
        );
        m.mark_success(Utc::now());
        run
    }
}
