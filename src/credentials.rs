// Credential resolution: an ordered list of resolvers, first non-empty value wins.
// Production order is environment, then the INI credentials file.

use std::path::Path;

use config::{Config, File, FileFormat};
use tracing::debug;

use crate::collector::CollectorKind;
use crate::error::{MetricsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Site,
    User,
    Key,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Site, Field::User, Field::Key];

    /// Key inside the collector's INI section.
    pub fn ini_key(self) -> &'static str {
        match self {
            Field::Site => "site",
            Field::User => "user",
            Field::Key => "key",
        }
    }

    pub fn env_var(self, kind: CollectorKind) -> String {
        let suffix = match self {
            Field::Site => "API_SITE",
            Field::User => "API_USER",
            Field::Key => "API_KEY",
        };
        format!("{}_{}", kind.env_prefix(), suffix)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub site: String,
    pub user: String,
    pub key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("site", &self.site)
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .finish()
    }
}

pub trait CredentialResolver {
    /// Resolver name for logs.
    fn source(&self) -> &'static str;

    fn lookup(&self, kind: CollectorKind, field: Field) -> Option<String>;
}

/// `<SERVICE>_API_SITE`, `<SERVICE>_API_USER`, `<SERVICE>_API_KEY`.
pub struct EnvResolver;

impl CredentialResolver for EnvResolver {
    fn source(&self) -> &'static str {
        "env"
    }

    fn lookup(&self, kind: CollectorKind, field: Field) -> Option<String> {
        std::env::var(field.env_var(kind)).ok()
    }
}

/// INI file with one section per collector (`[jenkins]`, `[discourse]`), keys `site`, `user`, `key`.
/// A missing file resolves nothing.
pub struct IniFileResolver {
    config: Config,
}

impl IniFileResolver {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini).required(false))
            .build()?;
        debug!(path = %path.display(), "credentials file loaded");
        Ok(Self { config })
    }

    pub fn from_ini_str(ini: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(ini, FileFormat::Ini))
            .build()?;
        Ok(Self { config })
    }
}

impl CredentialResolver for IniFileResolver {
    fn source(&self) -> &'static str {
        "file"
    }

    fn lookup(&self, kind: CollectorKind, field: Field) -> Option<String> {
        self.config
            .get_string(&format!("{}.{}", kind.name(), field.ini_key()))
            .ok()
    }
}

/// Resolve all three credentials for `kind`, trying `resolvers` in order.
/// Fails with `Configuration` naming every variable that stayed empty.
pub fn resolve(kind: CollectorKind, resolvers: &[Box<dyn CredentialResolver>]) -> Result<Credentials> {
    let mut found: [Option<String>; 3] = [None, None, None];
    for (slot, field) in found.iter_mut().zip(Field::ALL) {
        *slot = resolvers.iter().find_map(|r| {
            let value = r.lookup(kind, field).filter(|v| !v.trim().is_empty())?;
            debug!(collector = %kind, field = field.ini_key(), source = r.source(), "credential resolved");
            Some(value)
        });
    }

    let missing: Vec<String> = Field::ALL
        .iter()
        .zip(&found)
        .filter(|(_, v)| v.is_none())
        .map(|(f, _)| f.env_var(kind))
        .collect();
    let [Some(site), Some(user), Some(key)] = found else {
        return Err(MetricsError::Configuration {
            collector: kind.name(),
            expected: Field::ALL.iter().map(|f| f.env_var(kind)).collect(),
            missing,
        });
    };
    Ok(Credentials { site, user, key })
}
