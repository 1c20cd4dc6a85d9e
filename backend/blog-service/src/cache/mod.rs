//! Read-through query cache
//!
//! Read actions declare a [`CacheStrategy`] (freshness window, stale window and
//! tags). [`CacheLayer`] serves entries according to their age:
//!
//! - fresh: returned as is
//! - stale: returned, and one background task reloads the entry
//! - expired or missing: loaded from the store and written back
//!
//! The cache is never authoritative. Backend failures are logged and the
//! store is consulted instead.

pub mod memory;
pub mod redis_cache;

pub use memory::MemoryQueryCache;
pub use redis_cache::RedisQueryCache;

use async_trait::async_trait;
use cache_invalidation::build_cache_key;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

lazy_static! {
    /// Lookups by outcome (fresh/stale/miss)
    static ref QUERY_CACHE_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "blog_query_cache_lookups_total",
        "Query cache lookups by outcome",
        &["outcome"]
    )
    .expect("Failed to register blog_query_cache_lookups_total");
}

pub const USERS_LIST_TAG: &str = "users_list";
pub const POSTS_LIST_TAG: &str = "posts_list";

/// Tag covering everything cached about one user
pub fn user_tag(user_id: &str) -> String {
    format!("user_{}", user_id)
}

// Keys are namespaced by the tag that evicts them.

pub fn users_list_key() -> String {
    build_cache_key(USERS_LIST_TAG, "all")
}

pub fn posts_list_key(limit: i64) -> String {
    build_cache_key(POSTS_LIST_TAG, &limit.to_string())
}

pub fn user_profile_key(user_id: &str) -> String {
    build_cache_key(&user_tag(user_id), "profile")
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// How long a cached read stays usable, and which tags evict it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStrategy {
    pub ttl: Duration,
    pub swr: Duration,
    pub tags: Vec<String>,
}

impl CacheStrategy {
    pub fn users_list() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            swr: Duration::ZERO,
            tags: vec![USERS_LIST_TAG.to_string()],
        }
    }

    /// Always revalidated in the background; served stale for up to 120s
    pub fn posts_list() -> Self {
        Self {
            ttl: Duration::ZERO,
            swr: Duration::from_secs(120),
            tags: vec![POSTS_LIST_TAG.to_string()],
        }
    }

    pub fn user_profile(user_id: &str) -> Self {
        Self {
            ttl: Duration::from_secs(30),
            swr: Duration::from_secs(60),
            tags: vec![user_tag(user_id)],
        }
    }

    /// How long a backend has to keep an entry around
    pub fn retention(&self) -> Duration {
        self.ttl + self.swr
    }

    pub fn freshness(&self, age: Duration) -> Freshness {
        if age < self.ttl {
            Freshness::Fresh
        } else if age < self.retention() {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

/// A serialized query result and the moment it was loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub payload: String,
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    pub fn encode<T: Serialize>(value: &T) -> CacheResult<Self> {
        Ok(Self {
            payload: serde_json::to_string(value)?,
            stored_at: Utc::now(),
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> CacheResult<T> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Time since the entry was stored; clock skew counts as zero
    pub fn age(&self) -> Duration {
        (Utc::now() - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Storage backend for cached query results
#[async_trait]
pub trait QueryCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedEntry>>;

    async fn put(&self, key: &str, entry: CachedEntry, strategy: &CacheStrategy)
        -> CacheResult<()>;

    /// Drop every entry stored under any of `tags`, returning how many went
    async fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize>;
}

/// Stale-while-revalidate policy on top of a [`QueryCache`] backend
///
/// Every invalidation bumps `epoch`. A load only writes its result back if
/// the epoch it started under is still current, so a load that raced a write
/// cannot restore pre-write data.
#[derive(Clone)]
pub struct CacheLayer {
    backend: Arc<dyn QueryCache>,
    refreshing: Arc<DashMap<String, ()>>,
    epoch: Arc<AtomicU64>,
    // Write-held while invalidating; read-held while checking epoch and storing
    invalidation: Arc<RwLock<()>>,
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn QueryCache>) -> Self {
        Self {
            backend,
            refreshing: Arc::new(DashMap::new()),
            epoch: Arc::new(AtomicU64::new(0)),
            invalidation: Arc::new(RwLock::new(())),
        }
    }

    pub fn backend(&self) -> &Arc<dyn QueryCache> {
        &self.backend
    }

    /// Serve `key` from cache according to `strategy`, calling `load` when
    /// the entry is missing or must be refreshed.
    ///
    /// `load` errors are returned unchanged on a miss. During a background
    /// refresh they are only logged.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        key: &str,
        strategy: CacheStrategy,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: Display + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self.backend.get(key).await {
            Ok(Some(entry)) => match strategy.freshness(entry.age()) {
                Freshness::Fresh => match entry.decode::<T>() {
                    Ok(value) => {
                        QUERY_CACHE_LOOKUPS.with_label_values(&["fresh"]).inc();
                        debug!(key = %key, "Query cache hit");
                        return Ok(value);
                    }
                    Err(e) => warn!(key = %key, error = %e, "Discarding undecodable cache entry"),
                },
                Freshness::Stale => match entry.decode::<T>() {
                    Ok(value) => {
                        QUERY_CACHE_LOOKUPS.with_label_values(&["stale"]).inc();
                        debug!(key = %key, "Query cache stale hit, refreshing in background");
                        self.spawn_refresh(key.to_string(), strategy, load);
                        return Ok(value);
                    }
                    Err(e) => warn!(key = %key, error = %e, "Discarding undecodable cache entry"),
                },
                Freshness::Expired => {}
            },
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Query cache read failed, using store"),
        }

        QUERY_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
        debug!(key = %key, "Query cache miss");

        let started = self.epoch.load(Ordering::SeqCst);
        let value = load().await?;
        if let Some(entry) = encode_entry(key, &value, &strategy) {
            self.store_if_current(key, entry, &strategy, started).await;
        }
        Ok(value)
    }

    /// Reload `key` off the request path; one refresh per key at a time
    fn spawn_refresh<T, E, F, Fut>(&self, key: String, strategy: CacheStrategy, load: F)
    where
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if self.refreshing.insert(key.clone(), ()).is_some() {
            return;
        }

        let layer = self.clone();
        let started = self.epoch.load(Ordering::SeqCst);

        tokio::spawn(async move {
            match load().await {
                Ok(value) => {
                    if let Some(entry) = encode_entry(&key, &value, &strategy) {
                        layer.store_if_current(&key, entry, &strategy, started).await;
                    }
                }
                Err(e) => warn!(key = %key, error = %e, "Background cache refresh failed"),
            }
            layer.refreshing.remove(&key);
        });
    }

    async fn store_if_current(
        &self,
        key: &str,
        entry: CachedEntry,
        strategy: &CacheStrategy,
        started: u64,
    ) {
        let _guard = self.invalidation.read().await;
        if self.epoch.load(Ordering::SeqCst) != started {
            debug!(key = %key, "Discarding load that overlapped an invalidation");
            return;
        }
        put_entry(self.backend.as_ref(), key, entry, strategy).await;
    }

    /// Evict tagged entries; failures are logged, never returned
    pub async fn invalidate_tags(&self, tags: &[String]) {
        let _guard = self.invalidation.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);

        match self.backend.invalidate_tags(tags).await {
            Ok(removed) => debug!(tags = ?tags, removed, "Invalidated query cache tags"),
            Err(e) => warn!(tags = ?tags, error = %e, "Query cache tag invalidation failed"),
        }
    }
}

fn encode_entry<T: Serialize>(
    key: &str,
    value: &T,
    strategy: &CacheStrategy,
) -> Option<CachedEntry> {
    if strategy.retention().is_zero() {
        return None;
    }

    match CachedEntry::encode(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to encode cache entry");
            None
        }
    }
}

async fn put_entry(
    backend: &dyn QueryCache,
    key: &str,
    entry: CachedEntry,
    strategy: &CacheStrategy,
) {
    if let Err(e) = backend.put(key, entry, strategy).await {
        warn!(key = %key, error = %e, "Query cache write failed");
    }
}
