//! Orchestrator: wires the watcher queue to the detector and runs until stopped.

use crate::config::{DetectorConfig, ResolvedPaths};
use crate::detector::Detector;
use crate::error::DetectorError;
use crate::events::{EventWatcher, PathFilter, QueuePoll};
use crate::model::Classifier;
use crate::response::SystemProcessTable;
use crate::status::PidFile;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Startup validation and detector construction, without starting intake.
pub fn prepare(config: &DetectorConfig) -> Result<(ResolvedPaths, Detector), DetectorError> {
    let paths = config.resolve()?;
    let classifier = Classifier::resolve(&config.classifier)?;
    let detector = Detector::new(
        config,
        &paths,
        classifier,
        Box::new(SystemProcessTable::new()),
    )?;
    Ok((paths, detector))
}

/// Run the detector until `stop` is set or the watcher goes away.
///
/// Shutdown stops intake first, then handles whatever is already queued. An
/// in-flight backup is left to finish on its own thread.
pub fn run(config: &DetectorConfig, stop: Arc<AtomicBool>) -> Result<(), DetectorError> {
    let (paths, detector) = prepare(config)?;
    let _pid_file = PidFile::create(&config.state_dir)?;

    if config.backup.initial_backup && detector.backups().spawn("initial").is_none() {
        warn!("initial backup skipped; another run holds the lock");
    }

    let (watcher, queue) = EventWatcher::start(
        &paths.root,
        PathFilter::new(&paths),
        config.monitor.queue_capacity,
    )?;
    info!(
        root = %paths.root.display(),
        backups = %paths.backup_root.display(),
        log = %paths.log_file.display(),
        classifier = detector.classifier().is_some(),
        "monitoring started"
    );

    let tick = Duration::from_millis(config.monitor.sweep_interval_ms.max(1));
    let sweep_every = ChronoDuration::milliseconds(config.monitor.sweep_interval_ms as i64);
    let mut last_sweep = Utc::now();
    let mut handled: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        match queue.next(tick) {
            QueuePoll::Event(event) => {
                detector.handle(&event);
                handled += 1;
            }
            QueuePoll::Idle => {}
            QueuePoll::Closed => {
                warn!("watcher queue closed");
                break;
            }
        }
        let now = Utc::now();
        if now - last_sweep >= sweep_every {
            detector.sweep(now);
            last_sweep = now;
        }
    }

    info!("stopping intake");
    watcher.stop(&paths.root);
    let pending = queue.drain();
    if !pending.is_empty() {
        info!(count = pending.len(), "handling queued events");
    }
    for event in &pending {
        detector.handle(event);
    }
    handled += pending.len() as u64;

    if detector.backups().is_running() {
        info!("backup still in progress; not waiting for it");
    }
    info!(events = handled, "monitoring stopped");
    Ok(())
}
