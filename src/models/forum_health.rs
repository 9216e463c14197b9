// Forum health: open vs. total topics, for the Support category and the whole site.

use serde::{Deserialize, Serialize};

use super::snapshot::{
    Column, MetricSet, MetricValue, expect_count, expect_real, percent, serialize_percent,
};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForumHealth {
    pub open_support: u32,
    pub total_support: u32,
    #[serde(serialize_with = "serialize_percent")]
    pub percent_support: f64,
    pub open_all: u32,
    pub total_all: u32,
    #[serde(serialize_with = "serialize_percent")]
    pub percent_all: f64,
}

impl ForumHealth {
    /// Derive both percentages from raw counts (0 when a total is 0).
    pub fn from_counts(open_support: u32, total_support: u32, open_all: u32, total_all: u32) -> Self {
        Self {
            open_support,
            total_support,
            percent_support: percent(open_support, total_support),
            open_all,
            total_all,
            percent_all: percent(open_all, total_all),
        }
    }
}

impl MetricSet for ForumHealth {
    const TABLE: &'static str = "discourse";
    const COLUMNS: &'static [Column] = &[
        Column::integer("open_support"),
        Column::integer("total_support"),
        Column::real("percent_support"),
        Column::integer("open_all"),
        Column::integer("total_all"),
        Column::real("percent_all"),
    ];

    fn values(&self) -> Vec<MetricValue> {
        vec![
            MetricValue::Int(self.open_support as i64),
            MetricValue::Int(self.total_support as i64),
            MetricValue::Real(self.percent_support),
            MetricValue::Int(self.open_all as i64),
            MetricValue::Int(self.total_all as i64),
            MetricValue::Real(self.percent_all),
        ]
    }

    fn from_values(values: &[MetricValue]) -> Result<Self> {
        Ok(Self {
            open_support: expect_count(Self::TABLE, values, 0)?,
            total_support: expect_count(Self::TABLE, values, 1)?,
            percent_support: expect_real(Self::TABLE, values, 2)?,
            open_all: expect_count(Self::TABLE, values, 3)?,
            total_all: expect_count(Self::TABLE, values, 4)?,
            percent_all: expect_real(Self::TABLE, values, 5)?,
        })
    }
}
