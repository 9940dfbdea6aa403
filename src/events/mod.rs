//! Normalized filesystem events and the path filter that decides what is monitored.

mod watcher;

use chrono::{DateTime, Utc};
use notify::event::{ModifyKind, RemoveKind, RenameMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::ResolvedPaths;

pub use watcher::{EventWatcher, QueuePoll, WatchQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    Create,
    Modify,
    Delete,
    Rename,
}

impl FileEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileEventKind::Create => "create",
            FileEventKind::Modify => "modify",
            FileEventKind::Delete => "delete",
            FileEventKind::Rename => "rename",
        }
    }
}

/// One filesystem change, already filtered to the monitored tree.
/// For renames `path` is the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvent {
    pub id: String,
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<PathBuf>,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path: path.into(),
            kind,
            timestamp,
            old_path: None,
        }
    }

    pub fn rename(
        old_path: Option<PathBuf>,
        new_path: impl Into<PathBuf>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            old_path,
            ..Self::new(FileEventKind::Rename, new_path, timestamp)
        }
    }

    pub fn now(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self::new(kind, path, Utc::now())
    }
}

/// Decides which paths belong to the monitored tree.
#[derive(Debug, Clone)]
pub struct PathFilter {
    root: PathBuf,
    backup_root: PathBuf,
    log_file: PathBuf,
}

impl PathFilter {
    pub fn new(paths: &ResolvedPaths) -> Self {
        Self {
            root: paths.root.clone(),
            backup_root: paths.backup_root.clone(),
            log_file: paths.log_file.clone(),
        }
    }

    /// Under the root, outside the backup root, not the log file.
    pub fn is_monitored(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && !path.starts_with(&self.backup_root) && path != self.log_file
    }
}

/// Turns raw notifications into monitored [`FileEvent`]s.
///
/// Holds the one piece of state normalization needs: rename sources
/// (`RenameMode::From`) still waiting for their destination half.
#[derive(Debug)]
pub struct EventNormalizer {
    filter: PathFilter,
    pending_from: Vec<(Option<usize>, PathBuf)>,
}

impl EventNormalizer {
    pub fn new(filter: PathFilter) -> Self {
        Self {
            filter,
            pending_from: Vec::new(),
        }
    }

    /// Map one raw notification to zero or more monitored [`FileEvent`]s.
    ///
    /// Directory events are dropped. A paired rename is kept when either side
    /// is monitored; it is analyzed only through its destination later on.
    /// A destination half with no source (moved in from outside the tree)
    /// becomes `Create` for the file, or for every file under a moved-in
    /// directory. A source half that is still unpaired when the next
    /// notification arrives (moved out of the tree) becomes `Delete`.
    pub fn normalize(&mut self, raw: &notify::Event, now: DateTime<Utc>) -> Vec<FileEvent> {
        use notify::EventKind as K;
        let tracker = raw.attrs.tracker();
        let mut out = Vec::new();

        let paired_from = match raw.kind {
            K::Modify(ModifyKind::Name(RenameMode::To)) => self.take_pending(tracker),
            _ => None,
        };
        self.flush_unpaired(now, &mut out);

        match &raw.kind {
            K::Create(_) => {
                for p in raw.paths.iter().filter(|p| !p.is_dir() && self.filter.is_monitored(p)) {
                    out.push(FileEvent::new(FileEventKind::Create, p.clone(), now));
                }
            }
            K::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to] = raw.paths.as_slice() {
                    self.push_rename(from, to, now, &mut out);
                }
            }
            K::Modify(ModifyKind::Name(RenameMode::Any)) => {
                for p in raw.paths.iter().filter(|p| p.is_file() && self.filter.is_monitored(p)) {
                    out.push(FileEvent::rename(None, p.clone(), now));
                }
            }
            K::Modify(ModifyKind::Name(RenameMode::From)) => {
                self.pending_from
                    .extend(raw.paths.iter().map(|p| (tracker, p.clone())));
            }
            K::Modify(ModifyKind::Name(RenameMode::To)) => match (paired_from, raw.paths.first()) {
                // inotify follows a tracked pair with its own Both event
                (Some(_), _) if tracker.is_some() => {}
                (Some(from), Some(to)) => self.push_rename(&from, to, now, &mut out),
                _ => {
                    for p in &raw.paths {
                        self.push_moved_in(p, now, &mut out);
                    }
                }
            },
            K::Modify(ModifyKind::Name(RenameMode::Other)) => {}
            K::Modify(_) => {
                for p in raw.paths.iter().filter(|p| !p.is_dir() && self.filter.is_monitored(p)) {
                    out.push(FileEvent::new(FileEventKind::Modify, p.clone(), now));
                }
            }
            K::Remove(RemoveKind::Folder) => {}
            K::Remove(_) => {
                for p in raw.paths.iter().filter(|p| self.filter.is_monitored(p)) {
                    out.push(FileEvent::new(FileEventKind::Delete, p.clone(), now));
                }
            }
            K::Access(_) | K::Other | K::Any => {}
        }
        out
    }

    fn take_pending(&mut self, tracker: Option<usize>) -> Option<PathBuf> {
        let idx = self.pending_from.iter().position(|(t, _)| *t == tracker)?;
        Some(self.pending_from.remove(idx).1)
    }

    fn flush_unpaired(&mut self, now: DateTime<Utc>, out: &mut Vec<FileEvent>) {
        for (_, p) in self.pending_from.drain(..) {
            if self.filter.is_monitored(&p) {
                out.push(FileEvent::new(FileEventKind::Delete, p, now));
            }
        }
    }

    fn push_rename(&self, from: &Path, to: &Path, now: DateTime<Utc>, out: &mut Vec<FileEvent>) {
        if !to.is_dir() && (self.filter.is_monitored(from) || self.filter.is_monitored(to)) {
            out.push(FileEvent::rename(Some(from.to_path_buf()), to.to_path_buf(), now));
        }
    }

    fn push_moved_in(&self, path: &Path, now: DateTime<Utc>, out: &mut Vec<FileEvent>) {
        if !self.filter.is_monitored(path) {
            return;
        }
        if path.is_file() {
            out.push(FileEvent::new(FileEventKind::Create, path, now));
        } else if path.is_dir() {
            let files = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && self.filter.is_monitored(e.path()));
            for entry in files {
                out.push(FileEvent::new(FileEventKind::Create, entry.into_path(), now));
            }
        }
    }
}
