//! Pid file and the running/stopped status a supervisor queries.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::{Pid, System};
use tracing::warn;

pub const PID_FILE_NAME: &str = "detector.pid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorStatus {
    pub state: RunState,
    pub pid: Option<u32>,
}

/// Written at startup, removed on drop.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(state_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(PID_FILE_NAME);
        std::fs::write(&path, std::process::id().to_string())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "could not remove pid file");
        }
    }
}

/// Status from the pid file, checking liveness through the OS process table.
pub fn status(state_dir: &Path) -> DetectorStatus {
    status_with(state_dir, |pid| {
        let mut sys = System::new();
        sys.refresh_process(Pid::from_u32(pid))
    })
}

pub fn status_with(state_dir: &Path, is_alive: impl Fn(u32) -> bool) -> DetectorStatus {
    let pid = std::fs::read_to_string(state_dir.join(PID_FILE_NAME))
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok());
    match pid {
        Some(pid) if is_alive(pid) => DetectorStatus {
            state: RunState::Running,
            pid: Some(pid),
        },
        _ => DetectorStatus {
            state: RunState::Stopped,
            pid: None,
        },
    }
}
