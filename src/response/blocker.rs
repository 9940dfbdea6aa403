//! Best-effort process blocking: graceful terminate, then kill.
//!
//! Candidate selection is a coarse demonstration heuristic: the first running
//! process whose name contains an interpreter marker, other than ourselves and
//! anything still in its block cooldown. It has no link to the file event that
//! triggered it.

use crate::cooldown::ExpiringSet;
use crate::error::ProcessControlError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessStatus, System};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Terminate,
    Kill,
}

/// Seam over the OS process table so blocking can run against fakes.
pub trait ProcessTable: Send + Sync {
    fn processes(&self) -> Vec<ProcessInfo>;
    fn name(&self, pid: u32) -> Option<String>;
    fn is_alive(&self, pid: u32) -> bool;
    fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOutcome {
    /// Exited after the graceful signal
    Terminated,
    /// Exited after escalation to kill
    Killed,
    NotFound,
    AccessDenied,
    /// Still alive after both stages
    Survived,
    /// Blocked successfully within the cooldown window; not attempted
    CoolingDown,
}

impl BlockOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, BlockOutcome::Terminated | BlockOutcome::Killed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedProcessMemo {
    pub pid: u32,
    pub blocked_at: DateTime<Utc>,
}

pub struct ProcessBlocker {
    table: Box<dyn ProcessTable>,
    markers: Vec<String>,
    own_pid: u32,
    stage_timeout: Duration,
    poll_interval: Duration,
    cooldown: Mutex<ExpiringSet<u32>>,
}

impl ProcessBlocker {
    pub fn new(
        table: Box<dyn ProcessTable>,
        markers: &[String],
        cooldown: Duration,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            table,
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
            own_pid: std::process::id(),
            stage_timeout,
            poll_interval: Duration::from_millis(50),
            cooldown: Mutex::new(ExpiringSet::new(cooldown)),
        }
    }

    /// Block `pid` unless it is cooling down from an earlier successful block.
    pub fn block(&self, pid: u32, now: DateTime<Utc>) -> BlockOutcome {
        if self.cooldown.lock().contains(&pid, now) {
            info!(pid, "process recently blocked; skipping");
            return BlockOutcome::CoolingDown;
        }
        let outcome = self.terminate(pid);
        if outcome.is_blocked() {
            self.cooldown.lock().insert(pid, now);
        }
        outcome
    }

    /// Terminate, wait, kill, wait. Never consults or updates the cooldown.
    pub fn terminate(&self, pid: u32) -> BlockOutcome {
        let Some(name) = self.table.name(pid) else {
            warn!(pid, "process not found for blocking (already terminated?)");
            return BlockOutcome::NotFound;
        };
        info!(pid, name = %name, "attempting termination");

        match self.table.signal(pid, Signal::Terminate) {
            Ok(()) => {
                if self.wait_exit(pid) {
                    info!(pid, name = %name, action = "terminated", "[PROCESS_BLOCKED]");
                    return BlockOutcome::Terminated;
                }
                warn!(pid, name = %name, "did not terminate gracefully, attempting kill");
            }
            Err(ProcessControlError::NotFound(_)) => {
                warn!(pid, "process vanished before termination");
                return BlockOutcome::NotFound;
            }
            Err(ProcessControlError::AccessDenied(_)) => {
                error!(pid, "access denied blocking process; run with elevated privileges?");
                return BlockOutcome::AccessDenied;
            }
            Err(e) => warn!(pid, error = %e, "terminate failed, attempting kill"),
        }

        match self.table.signal(pid, Signal::Kill) {
            Ok(()) => {}
            Err(ProcessControlError::NotFound(_)) => {
                info!(pid, name = %name, action = "terminated", "[PROCESS_BLOCKED]");
                return BlockOutcome::Terminated;
            }
            Err(ProcessControlError::AccessDenied(_)) => {
                error!(pid, "access denied killing process");
                return BlockOutcome::AccessDenied;
            }
            Err(e) => {
                error!(pid, error = %e, "kill failed");
                return BlockOutcome::Survived;
            }
        }
        if self.wait_exit(pid) {
            info!(pid, name = %name, action = "killed", "[PROCESS_KILLED]");
            BlockOutcome::Killed
        } else {
            error!(pid, name = %name, "process survived terminate and kill");
            BlockOutcome::Survived
        }
    }

    /// First interpreter-like process that is neither us nor cooling down.
    pub fn find_candidate(&self, now: DateTime<Utc>) -> Option<ProcessInfo> {
        let mut procs = self.table.processes();
        procs.sort_by_key(|p| p.pid);
        let mut cooldown = self.cooldown.lock();
        procs.into_iter().find(|p| {
            let name = p.name.to_lowercase();
            p.pid != self.own_pid
                && self.markers.iter().any(|m| name.contains(m.as_str()))
                && !cooldown.contains(&p.pid, now)
        })
    }

    /// Pick a candidate and block it.
    pub fn block_suspect(&self, now: DateTime<Utc>) -> Option<(ProcessInfo, BlockOutcome)> {
        let candidate = self.find_candidate(now)?;
        warn!(
            pid = candidate.pid,
            name = %candidate.name,
            "SIMULATION HEURISTIC: identified process for blocking"
        );
        let outcome = self.block(candidate.pid, now);
        Some((candidate, outcome))
    }

    pub fn recently_blocked(&self, pid: u32, now: DateTime<Utc>) -> Option<BlockedProcessMemo> {
        self.cooldown
            .lock()
            .since(&pid, now)
            .map(|blocked_at| BlockedProcessMemo { pid, blocked_at })
    }

    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.cooldown.lock().sweep(now)
    }

    fn wait_exit(&self, pid: u32) -> bool {
        let deadline = Instant::now() + self.stage_timeout;
        loop {
            if !self.table.is_alive(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

/// Process table backed by `sysinfo`; signals go through `kill(2)` on unix so
/// EPERM and ESRCH can be told apart.
pub struct SystemProcessTable {
    sys: Mutex<System>,
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessTable for SystemProcessTable {
    fn processes(&self) -> Vec<ProcessInfo> {
        let mut sys = self.sys.lock();
        sys.refresh_processes();
        sys.processes()
            .iter()
            .map(|(pid, p)| ProcessInfo {
                pid: pid.as_u32(),
                name: p.name().to_string(),
            })
            .collect()
    }

    fn name(&self, pid: u32) -> Option<String> {
        let mut sys = self.sys.lock();
        let spid = Pid::from_u32(pid);
        if !sys.refresh_process(spid) {
            return None;
        }
        sys.process(spid).map(|p| p.name().to_string())
    }

    fn is_alive(&self, pid: u32) -> bool {
        let mut sys = self.sys.lock();
        let spid = Pid::from_u32(pid);
        if !sys.refresh_process(spid) {
            return false;
        }
        sys.process(spid)
            .is_some_and(|p| !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
    }

    #[cfg(unix)]
    fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal as NixSignal};

        let sig = match signal {
            Signal::Terminate => NixSignal::SIGTERM,
            Signal::Kill => NixSignal::SIGKILL,
        };
        // pid 0 and negative values address process groups
        let raw = match i32::try_from(pid) {
            Ok(raw) if raw > 0 => raw,
            _ => return Err(ProcessControlError::NotFound(pid)),
        };
        kill(nix::unistd::Pid::from_raw(raw), sig).map_err(|err| match err {
            Errno::ESRCH => ProcessControlError::NotFound(pid),
            Errno::EPERM => ProcessControlError::AccessDenied(pid),
            other => ProcessControlError::Signal {
                pid,
                detail: other.to_string(),
            },
        })
    }

    #[cfg(not(unix))]
    fn signal(&self, pid: u32, signal: Signal) -> Result<(), ProcessControlError> {
        let mut sys = self.sys.lock();
        let spid = Pid::from_u32(pid);
        if !sys.refresh_process(spid) {
            return Err(ProcessControlError::NotFound(pid));
        }
        let proc_ = sys.process(spid).ok_or(ProcessControlError::NotFound(pid))?;
        let delivered = match signal {
            Signal::Terminate => proc_
                .kill_with(sysinfo::Signal::Term)
                .unwrap_or_else(|| proc_.kill()),
            Signal::Kill => proc_.kill(),
        };
        if delivered {
            Ok(())
        } else {
            Err(ProcessControlError::AccessDenied(pid))
        }
    }
}
