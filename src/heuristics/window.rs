//! Per-path ring of recent modification timestamps.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ModificationWindow {
    capacity: usize,
    stamps: VecDeque<DateTime<Utc>>,
}

impl ModificationWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            stamps: VecDeque::with_capacity(capacity),
        }
    }

    /// Append in delivery order, evicting the oldest entry on overflow.
    pub fn push(&mut self, ts: DateTime<Utc>) {
        self.stamps.push_back(ts);
        while self.stamps.len() > self.capacity {
            self.stamps.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.stamps.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Seconds between the oldest and newest entry; 0 with fewer than two entries.
    pub fn span_secs(&self) -> f64 {
        match (self.stamps.front(), self.stamps.back()) {
            (Some(first), Some(last)) => {
                (*last - *first).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        }
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.stamps.iter()
    }
}
