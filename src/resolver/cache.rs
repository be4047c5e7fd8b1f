//! In-memory schema cache with optional TTL and LRU bound

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::key::SchemaKey;

#[derive(Debug)]
struct CacheEntry {
    schema: Arc<Value>,
    fetched_at: DateTime<Utc>,
    last_used: u64,
}

/// Schemas keyed by [`SchemaKey`]. Entries are never updated in place.
#[derive(Debug, Default)]
pub(crate) struct SchemaCache {
    entries: HashMap<SchemaKey, CacheEntry>,
    /// `None` is unbounded, `Some(0)` disables caching
    capacity: Option<usize>,
    tick: u64,
}

impl SchemaCache {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            tick: 0,
        }
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Fresh entry for `key`, if any. An expired entry is removed.
    pub(crate) fn get(
        &mut self,
        key: &SchemaKey,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Option<Arc<Value>> {
        let expired = {
            let entry = self.entries.get(key)?;
            match ttl {
                None => false,
                // An entry stamped in the future counts as fresh
                Some(ttl) => now
                    .signed_duration_since(entry.fetched_at)
                    .to_std()
                    .map(|age| age >= ttl)
                    .unwrap_or(false),
            }
        };

        if expired {
            self.entries.remove(key);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.schema)
        })
    }

    pub(crate) fn insert(&mut self, key: SchemaKey, schema: Arc<Value>, now: DateTime<Utc>) {
        if self.capacity == Some(0) {
            return;
        }

        self.entries.remove(&key);
        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.evict_least_recently_used();
            }
        }

        self.tick += 1;
        self.entries.insert(
            key,
            CacheEntry {
                schema,
                fetched_at: now,
                last_used: self.tick,
            },
        );
    }

    fn evict_least_recently_used(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
