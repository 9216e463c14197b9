// SQL for a metric table, derived from the collector's column list.
// Table and column names are compile-time constants of each MetricSet.

use crate::models::{Column, MetricSet};

/// Timestamp column. Unix seconds, one row per collection run.
pub const DATE_COLUMN: &str = "date";

pub fn create_table<M: MetricSet>() -> String {
    let columns: Vec<String> = M::COLUMNS
        .iter()
        .map(|c| format!("{} {} NOT NULL", c.name, c.ty.sql()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY, {})",
        M::TABLE,
        DATE_COLUMN,
        columns.join(", ")
    )
}

pub fn insert<M: MetricSet>() -> String {
    let placeholders: Vec<String> = (1..=M::COLUMNS.len() + 1)
        .map(|i| format!("${i}"))
        .collect();
    format!(
        "INSERT INTO {} ({}, {}) VALUES ({})",
        M::TABLE,
        DATE_COLUMN,
        column_list(M::COLUMNS),
        placeholders.join(", ")
    )
}

/// Rows strictly newer than `$1`, oldest first.
pub fn select_since<M: MetricSet>() -> String {
    format!(
        "SELECT {}, {} FROM {} WHERE {} > $1 ORDER BY {} ASC",
        DATE_COLUMN,
        column_list(M::COLUMNS),
        M::TABLE,
        DATE_COLUMN,
        DATE_COLUMN
    )
}

/// Newest `$1` rows, newest first (caller reverses).
pub fn select_recent<M: MetricSet>() -> String {
    format!(
        "SELECT {}, {} FROM {} ORDER BY {} DESC LIMIT $1",
        DATE_COLUMN,
        column_list(M::COLUMNS),
        M::TABLE,
        DATE_COLUMN
    )
}

fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}
