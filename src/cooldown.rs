//! Time-bounded membership set used for alert suppression and block cooldowns.
//! Entries expire lazily on lookup; [`ExpiringSet::sweep`] reclaims the rest.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct ExpiringSet<K> {
    ttl: Duration,
    entries: HashMap<K, DateTime<Utc>>,
}

impl<K: Eq + Hash + Clone> ExpiringSet<K> {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(36_500)),
            entries: HashMap::new(),
        }
    }

    /// Insert `key` at `now` unless an unexpired entry exists.
    /// Returns true when a new entry was created.
    pub fn insert(&mut self, key: K, now: DateTime<Utc>) -> bool {
        if self.contains(&key, now) {
            return false;
        }
        self.entries.insert(key, now);
        true
    }

    pub fn contains(&mut self, key: &K, now: DateTime<Utc>) -> bool {
        match self.entries.get(key) {
            Some(&since) if now - since < self.ttl => true,
            Some(_) => {
                self.entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// When the entry for `key` was recorded, if still live.
    pub fn since(&mut self, key: &K, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.contains(key, now) {
            self.entries.get(key).copied()
        } else {
            None
        }
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, since| now - *since < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_expires_after_ttl() {
        let t0 = Utc::now();
        let mut set = ExpiringSet::new(std::time::Duration::from_secs(60));
        assert!(set.insert("a", t0));
        assert!(!set.insert("a", t0 + Duration::seconds(30)));
        assert!(set.contains(&"a", t0 + Duration::seconds(59)));
        assert!(!set.contains(&"a", t0 + Duration::seconds(60)));
        assert!(set.insert("a", t0 + Duration::seconds(61)));
    }

    #[test]
    fn sweep_removes_only_expired() {
        let t0 = Utc::now();
        let mut set = ExpiringSet::new(std::time::Duration::from_secs(10));
        set.insert(1u32, t0);
        set.insert(2u32, t0 + Duration::seconds(8));
        assert_eq!(set.sweep(t0 + Duration::seconds(12)), 1);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&2, t0 + Duration::seconds(12)));
    }
}
