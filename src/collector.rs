// Shared collector capability: both remote services are reduced to "fetch once, return one
// metric set". Storage and windowed reporting are generic over the metric set (see pipeline).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use clap::ValueEnum;

use crate::credentials::CredentialResolver;
use crate::error::Result;
use crate::http::{HttpTransport, ResponseCache, SourceClient};
use crate::models::MetricSet;

/// Which remote service a collector talks to. Also names its credentials, table and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum CollectorKind {
    Jenkins,
    Discourse,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 2] = [CollectorKind::Jenkins, CollectorKind::Discourse];

    /// Lowercase identity: INI section, report file prefix, template name.
    pub fn name(self) -> &'static str {
        match self {
            CollectorKind::Jenkins => "jenkins",
            CollectorKind::Discourse => "discourse",
        }
    }

    /// Prefix of the `<PREFIX>_API_SITE` / `_API_USER` / `_API_KEY` environment variables.
    pub fn env_prefix(self) -> &'static str {
        match self {
            CollectorKind::Jenkins => "JENKINS",
            CollectorKind::Discourse => "DISCOURSE",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Collector {
    type Metrics: MetricSet;

    const KIND: CollectorKind;

    /// Walk the remote service once and aggregate its current state.
    fn collect(&self) -> impl Future<Output = Result<Self::Metrics>> + Send;
}

/// Builds a live collector from resolved credentials.
pub trait Authenticate: Collector + Sized {
    fn authenticate(
        resolvers: &[Box<dyn CredentialResolver>],
        cache: Arc<dyn ResponseCache>,
    ) -> Result<Self>;
}

impl<C> Authenticate for C
where
    C: Collector + From<SourceClient<HttpTransport>>,
{
    fn authenticate(
        resolvers: &[Box<dyn CredentialResolver>],
        cache: Arc<dyn ResponseCache>,
    ) -> Result<Self> {
        SourceClient::connect(C::KIND, resolvers, cache).map(C::from)
    }
}
