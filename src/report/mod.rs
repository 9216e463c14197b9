// Static HTML reports: one page per (collector, window) plus a cross-collector summary.
// Built-in templates are compiled in; a same-named file in templates_dir replaces one.

pub mod window;

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, context};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::collector::CollectorKind;
use crate::error::Result;
pub use window::{MetricAverage, MetricSeries, Point, WindowReport, cutoff, format_average, mean};

pub const SUMMARY_FILE: &str = "summary.html";

const BUILTIN_TEMPLATES: [(&str, &str); 4] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("jenkins.html", include_str!("../../templates/jenkins.html")),
    ("discourse.html", include_str!("../../templates/discourse.html")),
    ("summary.html", include_str!("../../templates/summary.html")),
];

/// Averages of one collector for one window, as returned by `render_window`.
#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub days: u32,
    pub snapshots: usize,
    pub averages: Vec<MetricAverage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectorSummary {
    pub collector: &'static str,
    pub windows: Vec<WindowSummary>,
}

/// `<collector>_<N>days.html`
pub fn window_file_name(kind: CollectorKind, days: u32) -> String {
    format!("{}_{}days.html", kind.name(), days)
}

pub struct Renderer {
    env: Environment<'static>,
    output_dir: PathBuf,
}

impl Renderer {
    pub fn new(templates_dir: &Path, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in BUILTIN_TEMPLATES {
            let custom = templates_dir.join(name);
            if custom.is_file() {
                debug!(template = name, path = %custom.display(), "using template override");
                env.add_template_owned(name, fs::read_to_string(&custom)?)?;
            } else {
                env.add_template(name, source)?;
            }
        }
        Ok(Self {
            env,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render one window page and return its averages.
    #[instrument(skip(self, report), fields(collector = kind.name(), days = report.days))]
    pub fn render_window(&self, kind: CollectorKind, report: &WindowReport) -> Result<WindowSummary> {
        let template = self.env.get_template(&format!("{}.html", kind.name()))?;
        let html = template.render(context! {
            collector => kind.name(),
            days => report.days,
            snapshots => report.snapshots,
            metrics => &report.metrics,
            generated_at => generated_at(),
        })?;
        let path = self.write(&window_file_name(kind, report.days), &html)?;
        info!(path = %path.display(), snapshots = report.snapshots, "window report written");

        Ok(WindowSummary {
            days: report.days,
            snapshots: report.snapshots,
            averages: report.averages(),
        })
    }

    #[instrument(skip(self, summaries))]
    pub fn render_summary(&self, summaries: &[CollectorSummary]) -> Result<PathBuf> {
        let template = self.env.get_template(SUMMARY_FILE)?;
        let html = template.render(context! {
            collectors => summaries,
            generated_at => generated_at(),
        })?;
        let path = self.write(SUMMARY_FILE, &html)?;
        info!(path = %path.display(), collectors = summaries.len(), "summary written");
        Ok(path)
    }

    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

fn generated_at() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M %Z").to_string()
}
