// End-to-end pipeline: collect → store → report, response caching, runner failure handling

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use lubuntumetrics::collector::{Collector, CollectorKind};
use lubuntumetrics::config::AppConfig;
use lubuntumetrics::discourse::DiscourseCollector;
use lubuntumetrics::error::MetricsError;
use lubuntumetrics::http::{NoCache, ResponseCache, TtlCache};
use lubuntumetrics::jenkins::JenkinsCollector;
use lubuntumetrics::models::{BuildHealth, ForumHealth};
use lubuntumetrics::pipeline::{collect_and_store, report_windows};
use lubuntumetrics::report::{Renderer, SUMMARY_FILE};
use lubuntumetrics::runner::{Mode, RunOutcome, Runner};
use serde_json::json;

fn forum_routes() -> FakeTransport {
    FakeTransport::new(vec![
        ("/categories.json", discourse_categories(&[(1, "Support"), (2, "Development")])),
        ("/c/1.json?page=0", discourse_page(1, 1)),
        ("/c/1.json?page=1", discourse_page(0, 0)),
        ("/c/2.json?page=0", discourse_page(2, 0)),
        ("/c/2.json?page=1", discourse_page(0, 0)),
    ])
}

#[tokio::test]
async fn collect_store_and_report_jenkins() {
    let (dir, repo) = temp_repo().await;
    let transport = FakeTransport::new(vec![(
        "/api/json",
        json!({ "jobs": [
            jenkins_job("a", Some(Some("SUCCESS")), Some(Some("SUCCESS"))),
            jenkins_job("b", Some(Some("FAILURE")), Some(Some("FAILURE"))),
        ]}),
    )]);
    let collector = JenkinsCollector::new(client(transport));

    let stored = collect_and_store(&collector, &repo).await.unwrap();
    assert_eq!(
        stored.metrics,
        BuildHealth {
            nonpassing: 1,
            failing: 1,
            total: 2
        }
    );

    let rows = repo.query::<BuildHealth>(stored.timestamp - 1).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], stored);

    let renderer = Renderer::new(&dir.path().join("none"), dir.path().join("out")).unwrap();
    let summary = report_windows::<BuildHealth>(
        CollectorKind::Jenkins,
        &repo,
        &renderer,
        &[1],
        stored.timestamp,
    )
    .await
    .unwrap();
    let total = summary.windows[0]
        .averages
        .iter()
        .find(|a| a.metric == "total")
        .unwrap();
    assert_eq!(total.value, 2.0);
    assert!(dir.path().join("out").join("jenkins_1days.html").exists());
}

#[tokio::test]
async fn shared_cache_serves_second_collection() {
    let transport = forum_routes();
    let cache: Arc<dyn ResponseCache> = Arc::new(TtlCache::new(Duration::from_secs(300), 100));
    let collector = DiscourseCollector::new(client_with_cache(transport.clone(), cache.clone()));

    let first = collector.collect().await.unwrap();
    let fetched = transport.calls();
    assert_eq!(fetched, 5);

    let second = collector.collect().await.unwrap();
    assert_eq!(transport.calls(), fetched);
    assert_eq!(first, second);
    assert_eq!(second, ForumHealth::from_counts(1, 2, 3, 4));
}

#[tokio::test]
async fn no_cache_fetches_every_time() {
    let transport = forum_routes();
    let collector =
        DiscourseCollector::new(client_with_cache(transport.clone(), Arc::new(NoCache)));

    collector.collect().await.unwrap();
    collector.collect().await.unwrap();
    assert_eq!(transport.calls(), 10);
}

#[tokio::test]
async fn cached_collections_are_both_stored() {
    let (_dir, repo) = temp_repo().await;
    let transport = forum_routes();
    let cache: Arc<dyn ResponseCache> = Arc::new(TtlCache::new(Duration::from_secs(300), 100));
    let collector = DiscourseCollector::new(client_with_cache(transport.clone(), cache));

    repo.ensure_schema::<ForumHealth>().await.unwrap();
    let first = collector.collect().await.unwrap();
    repo.insert_at(1000, &first).await.unwrap();
    let second = collector.collect().await.unwrap();
    repo.insert_at(2000, &second).await.unwrap();

    assert_eq!(transport.calls(), 5);
    let rows = repo.query::<ForumHealth>(0).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].metrics, rows[1].metrics);
}

#[tokio::test]
async fn failed_collection_stores_nothing() {
    let (_dir, repo) = temp_repo().await;
    let collector = JenkinsCollector::new(client(FakeTransport::new(vec![])));

    assert!(collect_and_store(&collector, &repo).await.is_err());
    assert!(repo.query::<BuildHealth>(0).await.unwrap().is_empty());
}

fn runner(dir: &tempfile::TempDir, repo: lubuntumetrics::snapshot_repo::SnapshotRepo) -> Runner {
    let renderer = Renderer::new(&dir.path().join("none"), dir.path().join("out")).unwrap();
    Runner::new(repo, renderer, Arc::new(NoCache), Vec::new(), vec![1, 7])
}

#[tokio::test]
async fn runner_collect_without_credentials_records_each_failure() {
    let (dir, repo) = temp_repo().await;
    let runner = runner(&dir, repo);

    let outcome = runner.run_all(&CollectorKind::ALL, Mode::Collect).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome.summaries.is_empty());
    for (kind, err) in &outcome.failures {
        match err {
            MetricsError::Configuration { collector, .. } => assert_eq!(*collector, kind.name()),
            other => panic!("expected Configuration, got {other:?}"),
        }
    }
    assert!(!dir.path().join("out").join(SUMMARY_FILE).exists());
}

#[tokio::test]
async fn runner_report_on_empty_store_renders_every_window() {
    let (dir, repo) = temp_repo().await;
    let runner = runner(&dir, repo);

    let outcome = runner.run_all(&CollectorKind::ALL, Mode::Report).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.summaries.len(), 2);
    let out = dir.path().join("out");
    for name in [
        "jenkins_1days.html",
        "jenkins_7days.html",
        "discourse_1days.html",
        "discourse_7days.html",
        SUMMARY_FILE,
    ] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    for summary in &outcome.summaries {
        for window in &summary.windows {
            assert_eq!(window.snapshots, 0);
            assert!(window.averages.iter().all(|a| a.value == 0.0));
        }
    }
}

#[tokio::test]
async fn runner_only_selected_collector() {
    let (dir, repo) = temp_repo().await;
    let runner = runner(&dir, repo);

    let outcome = runner.run_all(&[CollectorKind::Discourse], Mode::Report).await;

    assert_eq!(outcome.summaries.len(), 1);
    assert_eq!(outcome.summaries[0].collector, "discourse");
    assert!(!dir.path().join("out").join("jenkins_1days.html").exists());
}

#[tokio::test]
async fn runner_run_mode_stops_collector_before_report_on_failure() {
    let (dir, repo) = temp_repo().await;
    let runner = runner(&dir, repo);

    let outcome = runner.run_all(&[CollectorKind::Jenkins], Mode::Run).await;

    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.summaries.is_empty());
    assert!(!dir.path().join("out").join("jenkins_1days.html").exists());
    runner.repo().ensure_schema::<BuildHealth>().await.unwrap();
    assert!(runner.repo().query::<BuildHealth>(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn report_failure_after_insert_keeps_snapshot() {
    let (dir, repo) = temp_repo().await;
    // Output "directory" is a plain file, so every page write fails.
    let blocked = dir.path().join("out");
    std::fs::write(&blocked, "not a directory").unwrap();
    let renderer = Renderer::new(&dir.path().join("none"), &blocked).unwrap();
    let runner = Runner::new(repo, renderer, Arc::new(NoCache), Vec::new(), vec![7]);
    let transport = FakeTransport::new(vec![(
        "/api/json",
        json!({ "jobs": [jenkins_job("a", Some(Some("FAILURE")), Some(Some("FAILURE")))] }),
    )]);

    let mut outcome = RunOutcome::default();
    let result = runner
        .run_with(Mode::Run, || Ok(JenkinsCollector::new(client(transport))))
        .await;
    outcome.record(CollectorKind::Jenkins, result);

    assert!(!outcome.is_success());
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0],
        (CollectorKind::Jenkins, MetricsError::Io(_))
    ));
    let rows = runner.repo().query::<BuildHealth>(0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].metrics.failing, 1);
}

#[tokio::test]
async fn summary_render_failure_fails_the_run() {
    let (dir, repo) = temp_repo().await;
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join(SUMMARY_FILE), r#"{% include "missing.html" %}"#).unwrap();
    let renderer = Renderer::new(&templates, dir.path().join("out")).unwrap();
    let runner = Runner::new(repo, renderer, Arc::new(NoCache), Vec::new(), vec![1]);

    let outcome = runner.run_all(&CollectorKind::ALL, Mode::Report).await;

    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.summaries.len(), 2);
    assert!(matches!(outcome.summary_error, Some(MetricsError::Template(_))));
    assert!(!outcome.is_success());
    assert!(dir.path().join("out").join("jenkins_1days.html").exists());
    assert!(!dir.path().join("out").join(SUMMARY_FILE).exists());
}

fn app_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.path = dir.path().join("metrics.db").to_string_lossy().into_owned();
    config.report.output_dir = dir.path().join("out").to_string_lossy().into_owned();
    config.report.templates_dir = dir.path().join("templates").to_string_lossy().into_owned();
    config.credentials.path = dir.path().join("credentials").to_string_lossy().into_owned();
    config
}

/// Collect once through a freshly configured runner, as one scheduled invocation would.
async fn invoke(config: &AppConfig, transport: &FakeTransport) -> ForumHealth {
    let runner = Runner::from_config(config).await.unwrap();
    let collector = DiscourseCollector::new(client_with_cache(transport.clone(), runner.cache()));
    collector.collect().await.unwrap()
}

#[tokio::test]
async fn configured_cache_is_shared_between_invocations() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = app_config(&dir);
    let transport = forum_routes();

    let first = invoke(&config, &transport).await;
    assert_eq!(transport.calls(), 5);
    let second = invoke(&config, &transport).await;

    assert_eq!(transport.calls(), 5);
    assert_eq!(first, second);
}

#[tokio::test]
async fn memory_only_cache_refetches_per_invocation() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = app_config(&dir);
    config.cache.persist = false;
    let transport = forum_routes();

    invoke(&config, &transport).await;
    invoke(&config, &transport).await;

    assert_eq!(transport.calls(), 10);
}
