use super::{CacheResult, CacheStrategy, CachedEntry, QueryCache};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: CachedEntry,
    retention: Duration,
    tags: Vec<String>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.entry.age() >= self.retention
    }
}

/// Process-local query cache
///
/// Every `put` sweeps entries that outlived their strategy's retention, so the
/// map only holds what could still be served. The tag index shrinks with it.
#[derive(Default)]
pub struct MemoryQueryCache {
    entries: DashMap<String, StoredEntry>,
    tags: DashMap<String, DashSet<String>>,
}

impl MemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tags that still index at least one entry
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Drop `key` from each tag set, and drop sets left empty
    fn unlink(&self, key: &str, tags: &[String]) {
        for tag in tags {
            if let Some(keys) = self.tags.get(tag) {
                keys.remove(key);
            }
            self.tags.remove_if(tag, |_, keys| keys.is_empty());
        }
    }

    fn evict(&self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some((_, stored)) => {
                self.unlink(key, &stored.tags);
                true
            }
            None => false,
        }
    }

    fn sweep_expired(&self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|stored| stored.value().is_expired())
            .map(|stored| stored.key().clone())
            .collect();

        let swept = expired.iter().filter(|key| self.evict(key)).count();
        if swept > 0 {
            debug!(swept, "Swept expired query cache entries");
        }
        swept
    }
}

#[async_trait]
impl QueryCache for MemoryQueryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedEntry>> {
        let expired = match self.entries.get(key) {
            Some(stored) if !stored.is_expired() => return Ok(Some(stored.entry.clone())),
            Some(_) => true,
            None => false,
        };

        if expired && self.evict(key) {
            debug!(key = %key, "Evicted expired query cache entry");
        }
        Ok(None)
    }

    async fn put(
        &self,
        key: &str,
        entry: CachedEntry,
        strategy: &CacheStrategy,
    ) -> CacheResult<()> {
        self.sweep_expired();

        let stored = StoredEntry {
            entry,
            retention: strategy.retention(),
            tags: strategy.tags.clone(),
        };
        if stored.is_expired() {
            return Ok(());
        }

        if let Some(previous) = self.entries.insert(key.to_string(), stored) {
            let dropped: Vec<String> = previous
                .tags
                .into_iter()
                .filter(|tag| !strategy.tags.contains(tag))
                .collect();
            self.unlink(key, &dropped);
        }

        for tag in &strategy.tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize> {
        let mut removed = 0;
        for tag in tags {
            let Some((_, keys)) = self.tags.remove(tag) else {
                continue;
            };
            for key in keys {
                if self.evict(&key) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
