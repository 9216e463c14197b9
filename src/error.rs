// Library error type. Application glue (main, config loading) stays on anyhow.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    /// One or more credentials resolved to nothing. Fatal for that collector only.
    #[error("{collector}: {} must be defined (missing: {})", .expected.join(", "), .missing.join(", "))]
    Configuration {
        collector: &'static str,
        expected: Vec<String>,
        missing: Vec<String>,
    },

    #[error("invalid site url {site:?}: {source}")]
    SiteUrl {
        site: String,
        #[source]
        source: url::ParseError,
    },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{metric} count {count} does not fit a snapshot column")]
    CountOverflow { metric: &'static str, count: usize },

    #[error("stored row does not match {table} schema: {reason}")]
    Schema { table: &'static str, reason: String },

    #[error("sqlite: {0}")]
    Store(#[from] sqlx::Error),

    #[error("template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("credentials file: {0}")]
    CredentialsFile(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
