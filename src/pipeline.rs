// The per-collector pipeline: collect → store, then report for each window.
// Generic over the collector's metric set so both services share one implementation.

use tracing::{info, instrument};

use crate::collector::{Collector, CollectorKind};
use crate::error::Result;
use crate::models::{MetricSet, Snapshot};
use crate::report::{CollectorSummary, Renderer, WindowReport, cutoff};
use crate::snapshot_repo::SnapshotRepo;

/// Run one collection and append the result. The store assigns the timestamp.
#[instrument(skip(collector, repo), fields(collector = %C::KIND))]
pub async fn collect_and_store<C: Collector>(
    collector: &C,
    repo: &SnapshotRepo,
) -> Result<Snapshot<C::Metrics>> {
    repo.ensure_schema::<C::Metrics>().await?;
    let metrics = collector.collect().await?;
    let timestamp = repo.insert(&metrics).await?;
    info!(timestamp, "snapshot stored");
    Ok(Snapshot { timestamp, metrics })
}

/// Render one page per window from stored snapshots newer than `now - days`.
#[instrument(skip(repo, renderer, windows), fields(collector = %kind, windows = windows.len()))]
pub async fn report_windows<M: MetricSet>(
    kind: CollectorKind,
    repo: &SnapshotRepo,
    renderer: &Renderer,
    windows: &[u32],
    now: i64,
) -> Result<CollectorSummary> {
    repo.ensure_schema::<M>().await?;
    let mut summaries = Vec::with_capacity(windows.len());
    for &days in windows {
        let rows = repo.query::<M>(cutoff(now, days)).await?;
        let report = WindowReport::build(days, &rows);
        summaries.push(renderer.render_window(kind, &report)?);
    }
    Ok(CollectorSummary {
        collector: kind.name(),
        windows: summaries,
    })
}
