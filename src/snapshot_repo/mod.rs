// SQLite snapshot store. One append-only table per collector, keyed by collection time
// (Unix seconds). Rows are never updated or deleted.
//
// Inspecting stored data: `lubuntumetrics dump --collector jenkins --limit 5` prints the newest
// rows as JSON.

pub mod schema;

use crate::error::Result;
use crate::models::{ColumnType, MetricSet, MetricValue, Snapshot};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct SnapshotRepo {
    pool: SqlitePool,
}

impl SnapshotRepo {
    /// Connect to SQLite at `path`, create parent dir and DB if missing, enable WAL + pragmas.
    pub async fn connect(path: &str, max_pool_size: u32) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Shared with the persistent HTTP cache.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the collector's table if it doesn't exist. Safe to call on every run.
    #[instrument(skip(self), fields(repo = "snapshots", operation = "ensure_schema", table = M::TABLE))]
    pub async fn ensure_schema<M: MetricSet>(&self) -> Result<()> {
        sqlx::query(&schema::create_table::<M>())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append one snapshot stamped with the current time. Returns the assigned timestamp.
    pub async fn insert<M: MetricSet>(&self, metrics: &M) -> Result<i64> {
        let timestamp = chrono::Utc::now().timestamp();
        self.insert_at(timestamp, metrics).await?;
        Ok(timestamp)
    }

    /// Append one snapshot at an explicit timestamp. A second row for the same second is
    /// rejected by the primary key.
    #[instrument(skip(self, metrics), fields(repo = "snapshots", operation = "insert", table = M::TABLE))]
    pub async fn insert_at<M: MetricSet>(&self, timestamp: i64, metrics: &M) -> Result<()> {
        let sql = schema::insert::<M>();
        let mut query = sqlx::query(&sql).bind(timestamp);
        for value in metrics.values() {
            query = match value {
                MetricValue::Int(v) => query.bind(v),
                MetricValue::Real(v) => query.bind(v),
            };
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// Snapshots with timestamp > `since`, ascending by timestamp.
    #[instrument(skip(self), fields(repo = "snapshots", operation = "query", table = M::TABLE))]
    pub async fn query<M: MetricSet>(&self, since: i64) -> Result<Vec<Snapshot<M>>> {
        let rows = sqlx::query(&schema::select_since::<M>())
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_row::<M>(&row)?);
        }
        Ok(out)
    }

    /// The newest `limit` snapshots, returned oldest first (for inspection/debug).
    pub async fn recent<M: MetricSet>(&self, limit: u32) -> Result<Vec<Snapshot<M>>> {
        let rows = sqlx::query(&schema::select_recent::<M>())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_row::<M>(&row)?);
        }
        out.reverse();
        Ok(out)
    }

    fn parse_row<M: MetricSet>(row: &SqliteRow) -> Result<Snapshot<M>> {
        let timestamp: i64 = row.try_get(schema::DATE_COLUMN)?;
        let mut values = Vec::with_capacity(M::COLUMNS.len());
        for column in M::COLUMNS {
            let value = match column.ty {
                ColumnType::Integer => MetricValue::Int(row.try_get(column.name)?),
                ColumnType::Real => MetricValue::Real(row.try_get(column.name)?),
            };
            values.push(value);
        }
        Ok(Snapshot {
            timestamp,
            metrics: M::from_values(&values)?,
        })
    }
}
