//! ransom-guard: ransomware activity detector for a single monitored directory.
//!
//! Modular structure:
//! - [`events`]: Recursive watcher, path filtering, normalized file events
//! - [`heuristics`]: Ransom-note names and rapid-modification windows
//! - [`features`] / [`model`]: Optional logistic classifier over file features
//! - [`alerts`]: Alert logging and response dispatch
//! - [`response`]: Process blocking and backups
//! - [`detector`]: Per-event analysis and suppression
//! - [`runtime`]: Startup, processing loop, shutdown
//! - [`scan`], [`status`], [`logging`]: Supervisor-facing helpers

pub mod alerts;
pub mod cli;
pub mod config;
pub mod cooldown;
pub mod detector;
pub mod error;
pub mod events;
pub mod features;
pub mod heuristics;
pub mod logging;
pub mod model;
pub mod response;
pub mod runtime;
pub mod scan;
pub mod status;

pub use alerts::{AlertCoordinator, AlertResponse, Severity};
pub use config::{DetectorConfig, ResolvedPaths};
pub use detector::{Detector, EventReport};
pub use error::{ClassifierError, DatasetError, DetectorError, ProcessControlError};
pub use events::{FileEvent, FileEventKind};
pub use features::FeatureVector;
pub use heuristics::HeuristicEngine;
pub use logging::StructuredLogger;
pub use model::{Classifier, Prediction};
pub use response::{BackupManager, BackupOutcome, BlockOutcome, ProcessBlocker, ProcessTable};
