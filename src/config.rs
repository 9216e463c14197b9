use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the INI credentials file.
pub const DEFAULT_CREDENTIALS_PATH: &str = "~/.config/lubuntumetrics";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

fn default_db_path() -> String {
    "metrics.db".into()
}

fn default_max_pool_size() -> u32 {
    1
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Files here override the built-in templates of the same name.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    /// Trailing windows (days) to render, one page per collector each.
    #[serde(default = "default_windows")]
    pub windows: Vec<u32>,
}

fn default_output_dir() -> String {
    "output".into()
}

fn default_templates_dir() -> String {
    "templates".into()
}

fn default_windows() -> Vec<u32> {
    vec![1, 7, 30, 90, 180, 365]
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            templates_dir: default_templates_dir(),
            windows: default_windows(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// HTTP response time-to-live.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Keep responses in the database too, so invocations within `ttl_secs` share them.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_persist() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            persist: default_persist(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// INI file with `[jenkins]` / `[discourse]` sections. `~` expands to the home directory.
    #[serde(default = "default_credentials_path")]
    pub path: String,
}

fn default_credentials_path() -> String {
    DEFAULT_CREDENTIALS_PATH.into()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

impl CredentialsConfig {
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

/// Expand a leading `~` to the user's home directory; other paths pass through.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~')
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest.trim_start_matches('/'));
    }
    PathBuf::from(path)
}

impl AppConfig {
    /// `CONFIG_FILE` if set (must exist), else `config.toml` if present, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_path(Path::new(&path)),
            Err(_) => {
                let path = Path::new("config.toml");
                if path.exists() {
                    Self::load_from_path(path)
                } else {
                    tracing::debug!("no config.toml found, using defaults");
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            !self.report.output_dir.is_empty(),
            "report.output_dir must be non-empty"
        );
        anyhow::ensure!(
            !self.report.windows.is_empty(),
            "report.windows must list at least one window"
        );
        anyhow::ensure!(
            self.report.windows.iter().all(|d| *d > 0),
            "report.windows must all be > 0, got {:?}",
            self.report.windows
        );
        anyhow::ensure!(
            self.cache.ttl_secs > 0,
            "cache.ttl_secs must be > 0, got {}",
            self.cache.ttl_secs
        );
        anyhow::ensure!(
            self.cache.max_entries > 0,
            "cache.max_entries must be > 0, got {}",
            self.cache.max_entries
        );
        anyhow::ensure!(
            !self.credentials.path.is_empty(),
            "credentials.path must be non-empty"
        );
        Ok(())
    }
}
