// Authenticated handle to one remote service: site root + transport + response cache.

pub mod cache;
pub mod transport;

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::collector::CollectorKind;
use crate::credentials::{self, CredentialResolver};
use crate::error::{MetricsError, Result};
pub use cache::{NoCache, ResponseCache, SqliteCache, TieredCache, TtlCache};
pub use transport::{Auth, HttpTransport, Transport};

pub struct SourceClient<T> {
    site: Url,
    transport: T,
    cache: Arc<dyn ResponseCache>,
}

impl<T: Transport> SourceClient<T> {
    pub fn new(site: &str, transport: T, cache: Arc<dyn ResponseCache>) -> Result<Self> {
        // Relative joins drop the last path segment unless the base ends in '/'.
        let normalized = if site.ends_with('/') {
            site.to_string()
        } else {
            format!("{site}/")
        };
        let site = Url::parse(&normalized).map_err(|source| MetricsError::SiteUrl {
            site: site.to_string(),
            source,
        })?;
        Ok(Self {
            site,
            transport,
            cache,
        })
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path` (relative to the site root) with query pairs, served from cache when fresh.
    pub async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut url = self
            .site
            .join(path.trim_start_matches('/'))
            .map_err(|source| MetricsError::SiteUrl {
                site: self.site.to_string(),
                source,
            })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        if let Some(hit) = self.cache.get(url.as_str()).await {
            trace!(url = %url, "cache hit");
            return Ok(hit);
        }
        let body = self.transport.get_json(&url).await?;
        self.cache.insert(url.to_string(), body.clone()).await;
        Ok(body)
    }
}

impl SourceClient<HttpTransport> {
    /// Resolve `<SERVICE>_API_*` credentials and authenticate the way `kind` expects.
    pub fn connect(
        kind: CollectorKind,
        resolvers: &[Box<dyn CredentialResolver>],
        cache: Arc<dyn ResponseCache>,
    ) -> Result<Self> {
        let creds = credentials::resolve(kind, resolvers)?;
        let transport = HttpTransport::new(Auth::for_kind(kind, creds.user, creds.key))?;
        Self::new(&creds.site, transport, cache)
    }
}
