// Metric schemas for the two collectors, plus the generic snapshot row.

mod build_health;
mod forum_health;
mod snapshot;

pub use build_health::BuildHealth;
pub use forum_health::ForumHealth;
pub use snapshot::{Column, ColumnType, MetricSet, MetricValue, Snapshot, percent};
