// Window math: transpose stored rows into per-metric series and average them.
// No I/O here; rendering lives in report::mod.

use serde::Serialize;

use crate::models::{MetricSet, Snapshot};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Sparkline viewport (SVG user units).
const SPARK_WIDTH: f64 = 300.0;
const SPARK_HEIGHT: f64 = 40.0;

/// Oldest excluded timestamp for an N-day window ending at `now`.
pub fn cutoff(now: i64, days: u32) -> i64 {
    now - (days as i64) * SECONDS_PER_DAY
}

#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub timestamp: i64,
    /// UTC, minute precision.
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSeries {
    pub name: &'static str,
    pub points: Vec<Point>,
    pub average: f64,
    /// `average` to one decimal place.
    pub average_display: String,
    /// SVG polyline `points` attribute; empty when there are fewer than two points.
    pub sparkline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAverage {
    pub metric: &'static str,
    pub value: f64,
    pub display: String,
}

/// One rendered window: every metric of one collector over the last `days` days.
#[derive(Debug, Clone, Serialize)]
pub struct WindowReport {
    pub days: u32,
    pub snapshots: usize,
    pub metrics: Vec<MetricSeries>,
}

impl WindowReport {
    /// `rows` must already be restricted to the window and ordered by timestamp.
    pub fn build<M: MetricSet>(days: u32, rows: &[Snapshot<M>]) -> Self {
        let mut series: Vec<Vec<Point>> = M::COLUMNS
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for row in rows {
            let date = format_timestamp(row.timestamp);
            for (points, value) in series.iter_mut().zip(row.metrics.values()) {
                points.push(Point {
                    timestamp: row.timestamp,
                    date: date.clone(),
                    value: value.as_f64(),
                });
            }
        }

        let metrics = M::COLUMNS
            .iter()
            .zip(series)
            .map(|(column, points)| {
                let values: Vec<f64> = points.iter().map(|p| p.value).collect();
                let average = mean(&values);
                MetricSeries {
                    name: column.name,
                    sparkline: sparkline(&values),
                    average,
                    average_display: format_average(average),
                    points,
                }
            })
            .collect();

        Self {
            days,
            snapshots: rows.len(),
            metrics,
        }
    }

    pub fn averages(&self) -> Vec<MetricAverage> {
        self.metrics
            .iter()
            .map(|m| MetricAverage {
                metric: m.name,
                value: m.average,
                display: m.average_display.clone(),
            })
            .collect()
    }

    pub fn average(&self, metric: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.name == metric)
            .map(|m| m.average)
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / (v.len() as f64)
}

pub fn format_average(v: f64) -> String {
    format!("{:.1}", v)
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Scale `values` into the sparkline viewport; x by index, y inverted so larger is higher.
fn sparkline(values: &[f64]) -> String {
    if values.len() < 2 {
        return String::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let step = SPARK_WIDTH / (values.len() - 1) as f64;

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = i as f64 * step;
            let y = SPARK_HEIGHT - (v - min) / span * SPARK_HEIGHT;
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
