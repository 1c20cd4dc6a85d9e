use super::{CacheResult, CacheStrategy, CachedEntry, QueryCache};
use async_trait::async_trait;
use cache_invalidation::build_cache_key;
use redis::aio::ConnectionManager;
use tracing::debug;

const ENTRY_NAMESPACE: &str = "blog:query";
const TAG_NAMESPACE: &str = "blog:tag";

/// Query cache shared across instances through Redis
///
/// Entries are JSON strings expiring after the strategy's retention. Each
/// tag is a set of entry keys so invalidation can find them.
#[derive(Clone)]
pub struct RedisQueryCache {
    redis: ConnectionManager,
}

impl RedisQueryCache {
    pub async fn new(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { redis })
    }

    fn entry_key(key: &str) -> String {
        build_cache_key(ENTRY_NAMESPACE, key)
    }

    fn tag_key(tag: &str) -> String {
        build_cache_key(TAG_NAMESPACE, tag)
    }
}

#[async_trait]
impl QueryCache for RedisQueryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedEntry>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(Self::entry_key(key))
            .query_async(&mut self.redis.clone())
            .await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        entry: CachedEntry,
        strategy: &CacheStrategy,
    ) -> CacheResult<()> {
        let retention_secs = strategy.retention().as_secs().max(1);
        let entry_key = Self::entry_key(key);
        let value = serde_json::to_string(&entry)?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(&entry_key)
            .arg(&value)
            .arg("EX")
            .arg(retention_secs)
            .ignore();

        for tag in &strategy.tags {
            let tag_key = Self::tag_key(tag);
            pipe.cmd("SADD").arg(&tag_key).arg(&entry_key).ignore();
            pipe.cmd("EXPIRE")
                .arg(&tag_key)
                .arg(retention_secs)
                .ignore();
        }

        pipe.query_async::<_, ()>(&mut self.redis.clone()).await?;

        debug!(key = %entry_key, ttl_secs = retention_secs, "Stored query cache entry");
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize> {
        let mut conn = self.redis.clone();
        let mut removed = 0;

        for tag in tags {
            let tag_key = Self::tag_key(tag);
            let keys: Vec<String> = redis::cmd("SMEMBERS")
                .arg(&tag_key)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: usize = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                removed += deleted;
            }

            redis::cmd("DEL")
                .arg(&tag_key)
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        Ok(removed)
    }
}
