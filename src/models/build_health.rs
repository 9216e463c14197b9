// Build-system health: how many Jenkins jobs are red right now.

use serde::{Deserialize, Serialize};

use super::snapshot::{Column, MetricSet, MetricValue, expect_count};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildHealth {
    /// Jobs whose latest status is anything other than SUCCESS.
    pub nonpassing: u32,
    /// Subset of `nonpassing` whose status is exactly FAILURE.
    pub failing: u32,
    pub total: u32,
}

impl MetricSet for BuildHealth {
    const TABLE: &'static str = "jenkins";
    const COLUMNS: &'static [Column] = &[
        Column::integer("nonpassing"),
        Column::integer("failing"),
        Column::integer("total"),
    ];

    fn values(&self) -> Vec<MetricValue> {
        vec![
            MetricValue::Int(self.nonpassing as i64),
            MetricValue::Int(self.failing as i64),
            MetricValue::Int(self.total as i64),
        ]
    }

    fn from_values(values: &[MetricValue]) -> Result<Self> {
        Ok(Self {
            nonpassing: expect_count(Self::TABLE, values, 0)?,
            failing: expect_count(Self::TABLE, values, 1)?,
            total: expect_count(Self::TABLE, values, 2)?,
        })
    }
}
