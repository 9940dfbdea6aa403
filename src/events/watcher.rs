//! Recursive watcher feeding a bounded queue consumed by a single processing loop.

use super::{EventNormalizer, FileEvent, PathFilter};
use chrono::Utc;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;
use tracing::{debug, warn};

pub enum QueuePoll {
    Event(FileEvent),
    Idle,
    /// The watcher side is gone
    Closed,
}

/// Receiving end of the watcher queue. Per-path order is the delivery order.
pub struct WatchQueue {
    rx: Receiver<FileEvent>,
}

impl WatchQueue {
    /// Wait up to `timeout` for the next event.
    pub fn next(&self, timeout: Duration) -> QueuePoll {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => QueuePoll::Event(ev),
            Err(RecvTimeoutError::Timeout) => QueuePoll::Idle,
            Err(RecvTimeoutError::Disconnected) => QueuePoll::Closed,
        }
    }

    /// Take everything still queued without blocking.
    pub fn drain(&self) -> Vec<FileEvent> {
        self.rx.try_iter().collect()
    }
}

pub struct EventWatcher {
    watcher: RecommendedWatcher,
}

impl EventWatcher {
    /// Start watching `root` recursively. Notifications are normalized on the
    /// watcher thread and pushed into a queue of `capacity` events; a full queue
    /// blocks the watcher thread rather than dropping events.
    pub fn start(
        root: &Path,
        filter: PathFilter,
        capacity: usize,
    ) -> Result<(Self, WatchQueue), notify::Error> {
        let (tx, rx): (SyncSender<FileEvent>, _) = sync_channel(capacity.max(1));
        let mut normalizer = EventNormalizer::new(filter);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(raw) => {
                    for ev in normalizer.normalize(&raw, Utc::now()) {
                        if tx.send(ev).is_err() {
                            debug!("event queue closed; dropping notification");
                            return;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "watcher error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok((Self { watcher }, WatchQueue { rx }))
    }

    /// Stop intake. Events already queued stay readable from the [`WatchQueue`].
    pub fn stop(mut self, root: &Path) {
        if let Err(e) = self.watcher.unwatch(root) {
            debug!(error = %e, "unwatch failed");
        }
        drop(self.watcher);
    }
}
