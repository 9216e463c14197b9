// Raw JSON GET over the network. The cache sits in front of this (see SourceClient).

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::collector::CollectorKind;
use crate::error::{MetricsError, Result};
use crate::version;

/// How a service expects the user/key pair.
#[derive(Clone)]
pub enum Auth {
    /// HTTP basic auth with an API token as the password (Jenkins).
    Basic { user: String, key: String },
    /// `Api-Username` / `Api-Key` headers (Discourse).
    ApiKeyHeaders { user: String, key: String },
}

impl Auth {
    pub fn for_kind(kind: CollectorKind, user: String, key: String) -> Self {
        match kind {
            CollectorKind::Jenkins => Auth::Basic { user, key },
            CollectorKind::Discourse => Auth::ApiKeyHeaders { user, key },
        }
    }
}

pub trait Transport {
    fn get_json(&self, url: &Url) -> impl Future<Output = Result<Value>> + Send;
}

/// reqwest-backed transport. Library defaults for timeouts; no retry.
pub struct HttpTransport {
    client: reqwest::Client,
    auth: Auth,
}

impl HttpTransport {
    pub fn new(auth: Auth) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .user_agent(version::user_agent())
            .default_headers(headers)
            .build()?;
        Ok(Self { client, auth })
    }
}

impl Transport for HttpTransport {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        let request = self.client.get(url.clone());
        let request = match &self.auth {
            Auth::Basic { user, key } => request.basic_auth(user, Some(key)),
            Auth::ApiKeyHeaders { user, key } => request
                .header("Api-Username", user)
                .header("Api-Key", key),
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "GET");
        if !status.is_success() {
            return Err(MetricsError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
