// Generic snapshot row: timestamp + a fixed, collector-specific set of metric columns.

use serde::{Serialize, Serializer};

use crate::error::{MetricsError, Result};

/// SQL storage class of one metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
}

impl ColumnType {
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Integer,
        }
    }

    pub const fn real(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Real,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Real(f64),
}

impl MetricValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Real(v) => v,
        }
    }
}

/// A collector's metric schema. `values()` and `from_values()` are ordered as `COLUMNS`.
pub trait MetricSet: Sized + Clone + Serialize {
    /// Table holding this collector's time series.
    const TABLE: &'static str;
    const COLUMNS: &'static [Column];

    fn values(&self) -> Vec<MetricValue>;

    fn from_values(values: &[MetricValue]) -> Result<Self>;
}

/// One stored collection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<M> {
    pub timestamp: i64,
    #[serde(flatten)]
    pub metrics: M,
}

pub(crate) fn expect_int(
    table: &'static str,
    values: &[MetricValue],
    idx: usize,
) -> Result<i64> {
    match values.get(idx) {
        Some(MetricValue::Int(v)) => Ok(*v),
        Some(MetricValue::Real(v)) => Err(schema_err(
            table,
            format!("column {idx}: expected integer, got {v}"),
        )),
        None => Err(schema_err(table, format!("column {idx} missing"))),
    }
}

pub(crate) fn expect_real(
    table: &'static str,
    values: &[MetricValue],
    idx: usize,
) -> Result<f64> {
    values
        .get(idx)
        .map(|v| v.as_f64())
        .ok_or_else(|| schema_err(table, format!("column {idx} missing")))
}

/// Counts are stored as signed SQLite integers; anything negative is a corrupt row.
pub(crate) fn expect_count(
    table: &'static str,
    values: &[MetricValue],
    idx: usize,
) -> Result<u32> {
    let v = expect_int(table, values, idx)?;
    u32::try_from(v).map_err(|_| schema_err(table, format!("column {idx}: count out of range: {v}")))
}

fn schema_err(table: &'static str, reason: String) -> MetricsError {
    MetricsError::Schema { table, reason }
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn percent(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64) * 100.0
}

/// Serialize a percentage rounded to two decimals (dump output only; storage keeps full precision).
pub(crate) fn serialize_percent<S: Serializer>(v: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64((v * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_guards_zero_denominator() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn expect_count_rejects_negative() {
        let values = [MetricValue::Int(-1)];
        assert!(expect_count("t", &values, 0).is_err());
    }
}
