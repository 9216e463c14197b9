// Shared test helpers: canned remote services and in-memory credentials.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use lubuntumetrics::collector::CollectorKind;
use lubuntumetrics::credentials::{CredentialResolver, Field};
use lubuntumetrics::error::{MetricsError, Result};
use lubuntumetrics::http::{NoCache, ResponseCache, SourceClient, Transport};
use lubuntumetrics::snapshot_repo::SnapshotRepo;
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;

pub const SITE: &str = "https://example.test";

/// Serves canned JSON keyed by `path` or `path?page=N`; counts every network call.
#[derive(Clone, Default)]
pub struct FakeTransport {
    routes: Arc<HashMap<String, Value>>,
    calls: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<Url>>>,
}

impl FakeTransport {
    pub fn new(routes: Vec<(&str, Value)>) -> Self {
        Self {
            routes: Arc::new(
                routes
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every URL fetched so far, in order.
    pub fn requested(&self) -> Vec<Url> {
        self.requested.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn route_key(url: &Url) -> String {
        match url.query_pairs().find(|(k, _)| k == "page") {
            Some((_, page)) => format!("{}?page={}", url.path(), page),
            None => url.path().to_string(),
        }
    }
}

impl Transport for FakeTransport {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.clone());
        self.routes
            .get(&Self::route_key(url))
            .cloned()
            .ok_or_else(|| MetricsError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}

pub fn client(transport: FakeTransport) -> SourceClient<FakeTransport> {
    client_with_cache(transport, Arc::new(NoCache))
}

pub fn client_with_cache(
    transport: FakeTransport,
    cache: Arc<dyn ResponseCache>,
) -> SourceClient<FakeTransport> {
    SourceClient::new(SITE, transport, cache).unwrap()
}

/// Credentials from a fixed map of (collector, field) → value.
pub struct StaticResolver {
    pub name: &'static str,
    pub values: HashMap<(CollectorKind, &'static str), String>,
}

impl StaticResolver {
    pub fn new(name: &'static str, entries: &[(CollectorKind, Field, &str)]) -> Self {
        Self {
            name,
            values: entries
                .iter()
                .map(|(k, f, v)| ((*k, f.ini_key()), v.to_string()))
                .collect(),
        }
    }
}

impl CredentialResolver for StaticResolver {
    fn source(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, kind: CollectorKind, field: Field) -> Option<String> {
        self.values.get(&(kind, field.ini_key())).cloned()
    }
}

pub async fn temp_repo() -> (TempDir, SnapshotRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.db");
    let repo = SnapshotRepo::connect(path.to_str().unwrap(), 1).await.unwrap();
    (dir, repo)
}

pub fn jenkins_job(name: &str, last: Option<Option<&str>>, completed: Option<Option<&str>>) -> Value {
    let build = |result: Option<&str>| json!({ "number": 1, "result": result });
    json!({
        "name": name,
        "lastBuild": last.map(build),
        "lastCompletedBuild": completed.map(build),
    })
}

pub fn discourse_categories(categories: &[(u64, &str)]) -> Value {
    let list: Vec<Value> = categories
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name, "slug": name.to_lowercase() }))
        .collect();
    json!({ "category_list": { "categories": list } })
}

/// A topic page with `open` open topics followed by `closed` closed ones.
pub fn discourse_page(open: usize, closed: usize) -> Value {
    let topics: Vec<Value> = (0..open)
        .map(|_| json!({ "closed": false }))
        .chain((0..closed).map(|_| json!({ "closed": true })))
        .collect();
    json!({ "topic_list": { "topics": topics } })
}

/// A folder entry as returned with a nested `jobs[...]` tree.
pub fn jenkins_folder(name: &str, jobs: Vec<Value>) -> Value {
    json!({ "name": name, "jobs": jobs })
}
