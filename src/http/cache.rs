//! Response cache for remote GETs.
//!
//! Purely an optimization with no consistency guarantee. Entries expire after a fixed
//! time-to-live and are never invalidated. Two tiers:
//! - `TtlCache`: in-memory (moka), serves repeated URLs within one process.
//! - `SqliteCache`: `http_cache` table in the snapshot database, survives between invocations,
//!   so scheduled runs started close together share responses.
//!
//! `TieredCache` checks memory first, then SQLite, and promotes disk hits into memory.

use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};

use crate::error::Result;

/// Cache keyed by full request URL.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, url: &str) -> Option<Value>;

    async fn insert(&self, url: String, body: Value);
}

/// In-memory TTL cache.
pub struct TtlCache {
    cache: Cache<String, Value>,
}

impl TtlCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for TtlCache {
    async fn get(&self, url: &str) -> Option<Value> {
        self.cache.get(url)
    }

    async fn insert(&self, url: String, body: Value) {
        self.cache.insert(url, body);
    }
}

/// Persistent TTL cache on the snapshot database. Storage errors are logged and treated as
/// misses; a broken cache never fails a collection.
pub struct SqliteCache {
    pool: SqlitePool,
    ttl_secs: i64,
}

impl SqliteCache {
    /// Create `http_cache` if missing and drop rows that have already expired.
    #[instrument(skip(pool), fields(repo = "http_cache", operation = "open"))]
    pub async fn open(pool: SqlitePool, ttl: Duration) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS http_cache (url TEXT PRIMARY KEY, body TEXT NOT NULL, stored_at INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await?;

        let cache = Self {
            pool,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        };
        let pruned = sqlx::query("DELETE FROM http_cache WHERE stored_at <= $1")
            .bind(cache.fresh_after())
            .execute(&cache.pool)
            .await?
            .rows_affected();
        debug!(pruned, "http cache opened");
        Ok(cache)
    }

    /// Rows stored at or before this instant are stale.
    fn fresh_after(&self) -> i64 {
        chrono::Utc::now().timestamp().saturating_sub(self.ttl_secs)
    }

    async fn load(&self, url: &str) -> Result<Option<Value>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM http_cache WHERE url = $1 AND stored_at > $2")
                .bind(url)
                .bind(self.fresh_after())
                .fetch_optional(&self.pool)
                .await?;
        Ok(body.map(|b| serde_json::from_str::<Value>(&b)).transpose()?)
    }

    async fn store(&self, url: &str, body: &Value) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO http_cache (url, body, stored_at) VALUES ($1, $2, $3)")
            .bind(url)
            .bind(serde_json::to_string(body)?)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for SqliteCache {
    async fn get(&self, url: &str) -> Option<Value> {
        match self.load(url).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(url, error = %e, "http cache read failed");
                None
            }
        }
    }

    async fn insert(&self, url: String, body: Value) {
        if let Err(e) = self.store(&url, &body).await {
            warn!(url = %url, error = %e, "http cache write failed");
        }
    }
}

/// Memory in front of SQLite.
pub struct TieredCache {
    memory: TtlCache,
    disk: SqliteCache,
}

impl TieredCache {
    pub fn new(memory: TtlCache, disk: SqliteCache) -> Self {
        Self { memory, disk }
    }
}

#[async_trait]
impl ResponseCache for TieredCache {
    async fn get(&self, url: &str) -> Option<Value> {
        if let Some(hit) = self.memory.get(url).await {
            return Some(hit);
        }
        let hit = self.disk.get(url).await?;
        self.memory.insert(url.to_string(), hit.clone()).await;
        Some(hit)
    }

    async fn insert(&self, url: String, body: Value) {
        self.disk.insert(url.clone(), body.clone()).await;
        self.memory.insert(url, body).await;
    }
}

/// Never stores anything; every request goes to the network.
pub struct NoCache;

#[async_trait]
impl ResponseCache for NoCache {
    async fn get(&self, _url: &str) -> Option<Value> {
        None
    }

    async fn insert(&self, _url: String, _body: Value) {}
}
