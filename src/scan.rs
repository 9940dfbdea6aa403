//! On-demand scan of the monitored tree for executables and ransomware-style extensions.

use crate::config::ResolvedPaths;
use crate::features::EXECUTABLE_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const RANSOMWARE_EXTENSIONS: [&str; 7] =
    ["encrypted", "locked", "crypto", "ransom", "crypt", "pay", "wallet"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanIssueKind {
    Executable,
    SuspiciousExtension,
}

impl ScanIssueKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ScanIssueKind::Executable => "Executable found",
            ScanIssueKind::SuspiciousExtension => "Suspicious extension found",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanIssue {
    pub file: PathBuf,
    pub kind: ScanIssueKind,
    pub issue: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub files_scanned_count: usize,
    pub files_list: Vec<PathBuf>,
    pub potential_issues: Vec<ScanIssue>,
}

pub fn scan(paths: &ResolvedPaths) -> ScanReport {
    info!(root = %paths.root.display(), "starting scan");
    let mut report = ScanReport::default();
    let backup_root = paths.backup_root.clone();
    let walker = WalkDir::new(&paths.root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |e| !e.path().starts_with(&backup_root));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "scan entry unreadable");
                continue;
            }
        };
        if entry.file_type().is_dir() || entry.path() == paths.log_file {
            continue;
        }
        let path = entry.path();
        report.files_scanned_count += 1;
        report.files_list.push(path.to_path_buf());
        if let Some(kind) = classify_extension(path) {
            debug!(path = %path.display(), issue = kind.describe(), "scan finding");
            report.potential_issues.push(ScanIssue {
                file: path.to_path_buf(),
                kind,
                issue: kind.describe().to_string(),
            });
        }
    }
    info!(
        files = report.files_scanned_count,
        issues = report.potential_issues.len(),
        "scan complete"
    );
    report
}

fn classify_extension(path: &Path) -> Option<ScanIssueKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    if EXECUTABLE_EXTENSIONS.contains(&ext.as_str()) {
        Some(ScanIssueKind::Executable)
    } else if RANSOMWARE_EXTENSIONS.contains(&ext.as_str()) {
        Some(ScanIssueKind::SuspiciousExtension)
    } else {
        None
    }
}
