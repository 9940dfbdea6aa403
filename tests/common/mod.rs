//! Shared fixtures: scratch trees and a scripted process table.

#![allow(dead_code)]

use parking_lot::Mutex;
use ransom_guard::config::{DetectorConfig, ResolvedPaths};
use ransom_guard::error::ProcessControlError;
use ransom_guard::response::{ProcessInfo, ProcessTable, Signal};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// How a fake process reacts to signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    ExitOnTerminate,
    ExitOnKill,
    Immortal,
    Denied,
    /// Exits on terminate but stays listed, like a zombie awaiting reaping
    Lingers,
}

#[derive(Debug, Clone)]
struct FakeProcess {
    name: String,
    reaction: Reaction,
    alive: bool,
}

/// In-memory process table. Clones share state so a test can keep a handle
/// after boxing one into the blocker.
#[derive(Clone, Default)]
pub struct FakeProcessTable {
    procs: Arc<Mutex<BTreeMap<u32, FakeProcess>>>,
    signals: Arc<Mutex<Vec<(u32, Signal)>>>,
}

impl FakeProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, pid: u32, name: &str, reaction: Reaction) -> Self {
        self.procs.lock().insert(
            pid,
            FakeProcess {
                name: name.to_string(),
                reaction,
                alive: true,
            },
        );
        self
    }

    pub fn signals(&self) -> Vec<(u32, Signal)> {
        self.signals.lock().clone()
    }

    pub fn alive(&self, pid: u32) -> bool {
        self.procs.lock().get(&pid).is_some_and(|p| p.alive)
    }
}

impl ProcessTable for FakeProcessTable {
    fn processes(&self) -> Vec<ProcessInfo> {
        self.procs
            .lock()
            .iter()
            .filter(|(_, p)| p.alive || p.reaction == Reaction::Lingers)
            .map(|(pid, p)| ProcessInfo {
                pid: *pid,
                name: p.name.clone(),
            })
            .collect()
    }

    fn name(&self, pid: u32) -> Option<String> {
        self.procs
            .lock()
            .get(&pid)
            .filter(|p| p.alive)
            .map(|p| p.name.clone())
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive(pid)
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError> {
        self.signals.lock().push((pid, signal));
        let mut procs = self.procs.lock();
        let proc_ = procs
            .get_mut(&pid)
            .filter(|p| p.alive)
            .ok_or(ProcessControlError::NotFound(pid))?;
        match (proc_.reaction, signal) {
            (Reaction::Denied, _) => return Err(ProcessControlError::AccessDenied(pid)),
            (Reaction::ExitOnTerminate | Reaction::Lingers, _)
            | (Reaction::ExitOnKill, Signal::Kill) => {
                proc_.alive = false
            }
            _ => {}
        }
        Ok(())
    }
}

/// In-memory sink for log lines emitted under [`CapturedLog::subscriber`].
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Scratch layout: `<tmp>/docs` monitored, `<tmp>/backups`, `<tmp>/detect.log`.
pub struct Scratch {
    pub dir: TempDir,
    pub config: DetectorConfig,
    pub paths: ResolvedPaths,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let root = base.join("docs");
        std::fs::create_dir_all(&root).unwrap();

        let mut config = DetectorConfig::default();
        config.monitor.root = root;
        config.monitor.backup_root = Some(base.join("backups"));
        config.log.file = base.join("detect.log");
        config.state_dir = base.join("state");
        config.alerts.console_banner = false;
        config.blocker.stage_timeout_ms = 100;
        let paths = config.resolve().unwrap();
        Self { dir, config, paths }
    }

    pub fn file(&self, rel: &str) -> PathBuf {
        self.paths.root.join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.file(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}

/// CSV with the nine feature columns and the `Benign` label.
/// Malicious rows are all zeros, benign rows carry large values.
pub fn write_dataset(path: &std::path::Path, benign_rows: usize, malicious_rows: usize) {
    let mut out = String::from(
        "Name,DebugSize,MajorImageVersion,MajorOSVersion,ExportSize,IatVRA,NumberOfSections,SizeOfStackReserve,DllCharacteristics,ResourceSize,Benign\n",
    );
    for i in 0..benign_rows {
        let v = 100 + i;
        out.push_str(&format!(
            "good{i}.exe,{v},{v},{v},{v},{v},{v},{v},{v},{v},1\n"
        ));
    }
    for i in 0..malicious_rows {
        out.push_str(&format!("bad{i}.exe,0,0,0,0,0,0,0,0,0,0\n"));
    }
    std::fs::write(path, out).unwrap();
}
