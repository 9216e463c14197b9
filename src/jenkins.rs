// Build-health collector: one Jenkins job listing, classified by each job's latest result.
// Folders (and other job containers) are walked; only buildable leaf jobs are counted.

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::collector::{Collector, CollectorKind};
use crate::error::{MetricsError, Result};
use crate::http::{SourceClient, Transport};
use crate::models::BuildHealth;

/// Folder levels requested below the top-level listing.
pub const FOLDER_DEPTH: usize = 4;

const JOB_FIELDS: &str = "name,lastBuild[number,result],lastCompletedBuild[number,result]";

/// `tree` filter for `/api/json`: every job with its latest and latest completed build result,
/// recursing into child `jobs` for `depth` folder levels.
pub fn jobs_tree(depth: usize) -> String {
    let mut tree = format!("jobs[{JOB_FIELDS}]");
    for _ in 0..depth {
        tree = format!("jobs[{JOB_FIELDS},{tree}]");
    }
    tree
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub last_build: Option<BuildRef>,
    #[serde(default)]
    pub last_completed_build: Option<BuildRef>,
    /// Present on folders and multibranch projects, absent on buildable jobs.
    #[serde(default)]
    pub jobs: Option<Vec<Job>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    #[serde(default)]
    pub number: Option<u64>,
    /// Null while the build is still running.
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    Other(String),
}

impl From<&str> for BuildStatus {
    fn from(s: &str) -> Self {
        match s {
            "SUCCESS" => BuildStatus::Success,
            "FAILURE" => BuildStatus::Failure,
            "UNSTABLE" => BuildStatus::Unstable,
            "ABORTED" => BuildStatus::Aborted,
            "NOT_BUILT" => BuildStatus::NotBuilt,
            other => BuildStatus::Other(other.to_string()),
        }
    }
}

impl Job {
    pub fn is_folder(&self) -> bool {
        self.jobs.is_some()
    }

    /// Latest known status. A job that never built counts as passing; a running build falls
    /// back to the last completed one, and passing if there is none.
    pub fn status(&self) -> BuildStatus {
        let Some(last) = &self.last_build else {
            return BuildStatus::Success;
        };
        last.result
            .as_deref()
            .or_else(|| {
                self.last_completed_build
                    .as_ref()
                    .and_then(|b| b.result.as_deref())
            })
            .map(BuildStatus::from)
            .unwrap_or(BuildStatus::Success)
    }
}

/// Depth-first list of buildable jobs under `jobs`, folders excluded.
pub fn leaf_jobs(jobs: &[Job]) -> Vec<&Job> {
    let mut out = Vec::with_capacity(jobs.len());
    let mut stack: Vec<&Job> = jobs.iter().rev().collect();
    while let Some(job) = stack.pop() {
        match &job.jobs {
            Some(children) => stack.extend(children.iter().rev()),
            None => out.push(job),
        }
    }
    out
}

/// Narrow a job count to its snapshot column.
fn column_count(metric: &'static str, count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| MetricsError::CountOverflow { metric, count })
}

/// Count non-passing and failing leaf jobs.
pub fn tally(jobs: &[Job]) -> Result<BuildHealth> {
    let leaves = leaf_jobs(jobs);
    let total = column_count("total", leaves.len())?;
    let mut health = BuildHealth {
        total,
        ..Default::default()
    };
    // Both counters are bounded by `total`.
    for job in leaves {
        let status = job.status();
        if status != BuildStatus::Success {
            debug!(job = %job.name, status = ?status, "non-passing job");
            health.nonpassing += 1;
            if status == BuildStatus::Failure {
                health.failing += 1;
            }
        }
    }
    Ok(health)
}

pub struct JenkinsCollector<T> {
    client: SourceClient<T>,
}

impl<T> From<SourceClient<T>> for JenkinsCollector<T> {
    fn from(client: SourceClient<T>) -> Self {
        Self { client }
    }
}

impl<T: Transport> JenkinsCollector<T> {
    pub fn new(client: SourceClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SourceClient<T> {
        &self.client
    }

    /// Top-level listing with folder contents nested under each folder's `jobs`.
    pub async fn jobs(&self) -> Result<Vec<Job>> {
        let tree = jobs_tree(FOLDER_DEPTH);
        let body = self
            .client
            .get_json("api/json", &[("tree", tree.as_str())])
            .await?;
        let list: JobList = serde_json::from_value(body)?;
        Ok(list.jobs)
    }
}

impl<T: Transport + Sync> Collector for JenkinsCollector<T> {
    type Metrics = BuildHealth;

    const KIND: CollectorKind = CollectorKind::Jenkins;

    #[instrument(skip(self), fields(collector = "jenkins"))]
    async fn collect(&self) -> Result<BuildHealth> {
        let jobs = self.jobs().await?;
        let health = tally(&jobs)?;
        info!(
            total = health.total,
            nonpassing = health.nonpassing,
            failing = health.failing,
            "build health collected"
        );
        Ok(health)
    }
}
