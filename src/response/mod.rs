//! Response actions: process blocking and tree backups.

mod backup;
mod blocker;

pub use backup::{BackupManager, BackupOutcome, BackupRun, BackupSession, BackupStatus};
pub use blocker::{
    BlockOutcome, BlockedProcessMemo, ProcessBlocker, ProcessInfo, ProcessTable, Signal,
    SystemProcessTable,
};
