use anyhow::Result;
use clap::Parser;
use lubuntumetrics::cli::{Cli, Command};
use lubuntumetrics::collector::CollectorKind;
use lubuntumetrics::config::AppConfig;
use lubuntumetrics::models::{BuildHealth, ForumHealth, MetricSet};
use lubuntumetrics::runner::Runner;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app_config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    tracing::debug!(?app_config, "configuration loaded");

    let runner = Runner::from_config(&app_config).await?;

    if let Command::Dump { collector, limit } = cli.command {
        let json = match collector {
            CollectorKind::Jenkins => dump::<BuildHealth>(&runner, limit).await?,
            CollectorKind::Discourse => dump::<ForumHealth>(&runner, limit).await?,
        };
        println!("{}", json);
        return Ok(());
    }

    let Some(mode) = cli.command.mode() else {
        return Ok(());
    };
    let outcome = runner.run_all(&cli.collectors(), mode).await;
    if !outcome.is_success() {
        let mut failed: Vec<String> = outcome
            .failures
            .iter()
            .map(|(kind, e)| format!("{}: {}", kind, e))
            .collect();
        if let Some(e) = &outcome.summary_error {
            failed.push(format!("summary: {}", e));
        }
        anyhow::bail!("run failed: {}", failed.join("; "));
    }

    Ok(())
}

async fn dump<M: MetricSet>(runner: &Runner, limit: u32) -> Result<String> {
    runner.repo().ensure_schema::<M>().await?;
    let snapshots = runner.repo().recent::<M>(limit).await?;
    Ok(serde_json::to_string_pretty(&snapshots)?)
}
