//! Alert records and the coordinator that turns signals into actions.

use crate::response::{BackupManager, BlockOutcome, ProcessBlocker, ProcessInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// Value of the `severity` field on alert log lines.
    ///
    /// The level column shows tracing's own `ERROR`/`WARN`; filter alerts by
    /// this field, by the `[CRITICAL ALERT]`/`[WARNING]` message prefix, or by
    /// the `ransom_guard::alerts::critical` and `ransom_guard::alerts::warning`
    /// targets.
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Severity::Warning => "[WARNING]",
            Severity::Critical => "[CRITICAL ALERT]",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub path: PathBuf,
    pub reason: String,
    pub severity: Severity,
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAction {
    pub process: ProcessInfo,
    pub outcome: BlockOutcome,
}

/// Everything one trigger did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub record: AlertRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockAction>,
    pub backup_requested: bool,
}

pub struct AlertCoordinator {
    blocker: Option<ProcessBlocker>,
    backups: Arc<BackupManager>,
    log_file: PathBuf,
    console_banner: bool,
}

impl AlertCoordinator {
    pub fn new(
        blocker: Option<ProcessBlocker>,
        backups: Arc<BackupManager>,
        log_file: PathBuf,
        console_banner: bool,
    ) -> Self {
        Self {
            blocker,
            backups,
            log_file,
            console_banner,
        }
    }

    pub fn blocker(&self) -> Option<&ProcessBlocker> {
        self.blocker.as_ref()
    }

    /// Log the alert, optionally block a suspect process, and start a backup when
    /// the alert is Critical or a block succeeded.
    pub fn trigger(
        &self,
        reason: String,
        severity: Severity,
        path: &Path,
        attempt_block: bool,
        now: DateTime<Utc>,
    ) -> AlertResponse {
        match severity {
            Severity::Critical => error!(
                target: "ransom_guard::alerts::critical",
                severity = severity.tag(),
                path = %path.display(),
                "{} Reason: {}",
                severity.prefix(),
                reason
            ),
            Severity::Warning => warn!(
                target: "ransom_guard::alerts::warning",
                severity = severity.tag(),
                path = %path.display(),
                "{} Reason: {}",
                severity.prefix(),
                reason
            ),
        }
        if self.console_banner {
            self.print_banner(severity, &reason, path, now);
        }

        let block = if attempt_block {
            self.attempt_block(now)
        } else {
            None
        };
        let blocked = block.as_ref().is_some_and(|b| b.outcome.is_blocked());

        let backup_requested = severity == Severity::Critical || blocked;
        if backup_requested {
            info!("triggering immediate backup");
            self.backups.spawn("alert");
        }

        AlertResponse {
            record: AlertRecord {
                path: path.to_path_buf(),
                reason,
                severity,
                triggered_at: now,
            },
            block,
            backup_requested,
        }
    }

    fn attempt_block(&self, now: DateTime<Utc>) -> Option<BlockAction> {
        let blocker = self.blocker.as_ref()?;
        match blocker.block_suspect(now) {
            Some((process, outcome)) => {
                if !outcome.is_blocked() {
                    warn!(pid = process.pid, outcome = ?outcome, "failed to block process");
                }
                Some(BlockAction { process, outcome })
            }
            None => {
                info!("no suspicious process identified or all recently blocked");
                None
            }
        }
    }

    fn print_banner(&self, severity: Severity, reason: &str, path: &Path, now: DateTime<Utc>) {
        let prefix = severity.prefix();
        let rule = "=".repeat(10);
        println!("\n{rule} {prefix} RANSOMWARE ACTIVITY DETECTED {rule}");
        println!("Reason: {reason}");
        println!("Time: {}", now.format("%Y-%m-%d %H:%M:%S"));
        println!("File Involved: {}", path.display());
        println!("Check logs: {}", self.log_file.display());
        println!("{}\n", "=".repeat(42 + prefix.len()));
    }
}
