// One invocation: every selected collector in sequence, then the summary page.
// A failing collector is logged and recorded; the others still run.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::collector::{Authenticate, Collector, CollectorKind};
use crate::config::AppConfig;
use crate::credentials::{CredentialResolver, EnvResolver, IniFileResolver};
use crate::discourse::DiscourseCollector;
use crate::error::{MetricsError, Result};
use crate::http::{HttpTransport, ResponseCache, SqliteCache, TieredCache, TtlCache};
use crate::jenkins::JenkinsCollector;
use crate::pipeline;
use crate::report::{CollectorSummary, Renderer};
use crate::snapshot_repo::SnapshotRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Collect and store only.
    Collect,
    /// Render reports from stored snapshots only.
    Report,
    /// Collect, store, then report.
    Run,
}

impl Mode {
    pub fn collects(self) -> bool {
        matches!(self, Mode::Collect | Mode::Run)
    }

    pub fn reports(self) -> bool {
        matches!(self, Mode::Report | Mode::Run)
    }
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub summaries: Vec<CollectorSummary>,
    pub failures: Vec<(CollectorKind, MetricsError)>,
    /// Set when the collectors reported but `summary.html` could not be written.
    pub summary_error: Option<MetricsError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.summary_error.is_none()
    }

    /// Fold one collector's result into the outcome.
    pub fn record(&mut self, kind: CollectorKind, result: Result<Option<CollectorSummary>>) {
        match result {
            Ok(Some(summary)) => self.summaries.push(summary),
            Ok(None) => {}
            Err(e) => {
                error!(collector = %kind, error = %e, "collector failed");
                self.failures.push((kind, e));
            }
        }
    }
}

pub struct Runner {
    repo: SnapshotRepo,
    renderer: Renderer,
    cache: Arc<dyn ResponseCache>,
    resolvers: Vec<Box<dyn CredentialResolver>>,
    windows: Vec<u32>,
}

impl Runner {
    pub fn new(
        repo: SnapshotRepo,
        renderer: Renderer,
        cache: Arc<dyn ResponseCache>,
        resolvers: Vec<Box<dyn CredentialResolver>>,
        windows: Vec<u32>,
    ) -> Self {
        Self {
            repo,
            renderer,
            cache,
            resolvers,
            windows,
        }
    }

    /// Production wiring: SQLite at `database.path`, memory + database response cache,
    /// env then INI credentials.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let repo =
            SnapshotRepo::connect(&config.database.path, config.database.max_pool_size).await?;
        let renderer = Renderer::new(
            Path::new(&config.report.templates_dir),
            &config.report.output_dir,
        )?;
        let memory = TtlCache::new(config.cache.ttl(), config.cache.max_entries);
        let cache: Arc<dyn ResponseCache> = if config.cache.persist {
            let disk = SqliteCache::open(repo.pool().clone(), config.cache.ttl()).await?;
            Arc::new(TieredCache::new(memory, disk))
        } else {
            Arc::new(memory)
        };
        let resolvers: Vec<Box<dyn CredentialResolver>> = vec![
            Box::new(EnvResolver),
            Box::new(IniFileResolver::load(&config.credentials.resolved_path())?),
        ];
        Ok(Self::new(
            repo,
            renderer,
            cache,
            resolvers,
            config.report.windows.clone(),
        ))
    }

    pub fn repo(&self) -> &SnapshotRepo {
        &self.repo
    }

    pub fn cache(&self) -> Arc<dyn ResponseCache> {
        self.cache.clone()
    }

    /// Run every collector in `kinds`; render the summary if anything was reported.
    pub async fn run_all(&self, kinds: &[CollectorKind], mode: Mode) -> RunOutcome {
        let mut outcome = RunOutcome::default();
        for &kind in kinds {
            outcome.record(kind, self.run_one(kind, mode).await);
        }

        if mode.reports()
            && !outcome.summaries.is_empty()
            && let Err(e) = self.renderer.render_summary(&outcome.summaries)
        {
            error!(error = %e, "summary render failed");
            outcome.summary_error = Some(e);
        }
        info!(
            collectors = kinds.len(),
            failed = outcome.failures.len(),
            "run complete"
        );
        outcome
    }

    pub async fn run_one(&self, kind: CollectorKind, mode: Mode) -> Result<Option<CollectorSummary>> {
        match kind {
            CollectorKind::Jenkins => self.run_kind::<JenkinsCollector<HttpTransport>>(mode).await,
            CollectorKind::Discourse => {
                self.run_kind::<DiscourseCollector<HttpTransport>>(mode).await
            }
        }
    }

    async fn run_kind<C: Authenticate>(&self, mode: Mode) -> Result<Option<CollectorSummary>> {
        self.run_with(mode, || C::authenticate(&self.resolvers, self.cache.clone()))
            .await
    }

    /// Collect (building the collector only when `mode` collects), store, then report.
    /// A report failure after a successful insert leaves the snapshot stored.
    pub async fn run_with<C: Collector>(
        &self,
        mode: Mode,
        connect: impl FnOnce() -> Result<C>,
    ) -> Result<Option<CollectorSummary>> {
        if mode.collects() {
            let collector = connect()?;
            pipeline::collect_and_store(&collector, &self.repo).await?;
        }
        if !mode.reports() {
            return Ok(None);
        }
        let now = chrono::Utc::now().timestamp();
        let summary = pipeline::report_windows::<C::Metrics>(
            C::KIND,
            &self.repo,
            &self.renderer,
            &self.windows,
            now,
        )
        .await?;
        Ok(Some(summary))
    }
}
