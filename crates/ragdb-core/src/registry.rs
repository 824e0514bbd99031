//! TTL-evicting keyed registry.
//!
//! The explicit replacement for process-wide mutable tables: owned by
//! whoever constructs it, torn down with it, and evicted on a documented
//! TTL instead of growing forever.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    last_activity: Instant,
}

pub struct TtlRegistry<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V> TtlRegistry<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Insert or replace, stamping last activity.
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                last_activity: Instant::now(),
            },
        );
    }

    /// Fetch a live entry, refreshing its last activity. An expired
    /// entry is dropped and reported as absent.
    pub fn lookup(&mut self, key: &K) -> Option<&mut V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.last_activity.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.last_activity = Instant::now();
        Some(&mut entry.value)
    }

    /// Drop every entry idle longer than the TTL; returns how many went.
    pub fn evict_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| entry.last_activity.elapsed() <= ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
