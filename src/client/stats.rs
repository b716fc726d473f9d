//! NBA stats API client
//!
//! Provides [`StatsClient`] for calling `stats.nba.com` endpoints, and the
//! [`StatsProvider`] seam sources are written against.

use crate::error::{EtlError, Result};
use reqwest::Client;
use reqwest::header::{self, HeaderMap};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://stats.nba.com/stats/";

/// One named, tabular subset of a provider response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultSet {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub row_set: Vec<Vec<Value>>,
}

/// A provider response: a collection of named result sets
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsResponse {
    #[serde(rename = "resultSets", default)]
    pub result_sets: Vec<ResultSet>,
}

impl StatsResponse {
    pub fn select(&self, selector: &ResultSetSelector) -> Option<&ResultSet> {
        match selector {
            ResultSetSelector::Name(name) => self.result_sets.iter().find(|set| &set.name == name),
            ResultSetSelector::Index(index) => self.result_sets.get(*index),
        }
    }
}

/// Which result set of a response a source reads
///
/// In YAML: `{ name: TeamBackground }` or `{ index: 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SelectorFields")]
pub enum ResultSetSelector {
    Name(String),
    Index(usize),
}

/// Map form of a selector; exactly one field must be set
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SelectorFields {
    name: Option<String>,
    index: Option<usize>,
}

impl TryFrom<SelectorFields> for ResultSetSelector {
    type Error = String;

    fn try_from(fields: SelectorFields) -> std::result::Result<Self, Self::Error> {
        match (fields.name, fields.index) {
            (Some(name), None) => Ok(Self::Name(name)),
            (None, Some(index)) => Ok(Self::Index(index)),
            (Some(_), Some(_)) => Err("result_set takes either name or index, not both".into()),
            (None, None) => Err("result_set needs a name or an index".into()),
        }
    }
}

impl fmt::Display for ResultSetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{}'", name),
            Self::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Anything that can answer a stats request
pub trait StatsProvider: Send + Sync {
    /// Fetch `endpoint` with the given query parameters
    ///
    /// # Errors
    /// `SourceUnavailable` when the provider cannot be reached or answers
    /// with an error status or an undecodable body.
    fn fetch(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<StatsResponse>> + Send;
}

impl<P: StatsProvider> StatsProvider for Arc<P> {
    fn fetch(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<StatsResponse>> + Send {
        (**self).fetch(endpoint, params)
    }
}

impl<P: StatsProvider> StatsProvider for &P {
    fn fetch(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<StatsResponse>> + Send {
        (**self).fetch(endpoint, params)
    }
}

/// Connection settings for [`StatsClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
    /// Wait before retry `n` is `n * retry_backoff`
    pub retry_backoff: Duration,
}

impl ClientOptions {
    /// Options for `base_url` with a 30 s timeout and two retries
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_secs(3),
        }
    }
}

enum Attempt {
    Transient(EtlError),
    Fatal(EtlError),
}

/// HTTP client for the NBA stats API
///
/// The API rejects requests that don't look like they come from nba.com, so
/// the client carries browser-like default headers.
#[derive(Clone, Debug)]
pub struct StatsClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    retry_backoff: Duration,
}

impl StatsClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn try_new(options: ClientOptions) -> eyre::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".parse()?,
        );
        headers.insert(header::ACCEPT, "application/json, text/plain, */*".parse()?);
        headers.insert(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9".parse()?);
        headers.insert(header::REFERER, "https://www.nba.com/".parse()?);
        headers.insert(header::ORIGIN, "https://www.nba.com".parse()?);
        headers.insert("x-nba-stats-origin", "stats".parse()?);
        headers.insert("x-nba-stats-token", "true".parse()?);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()?;

        // Url::join drops the last path segment unless it ends with a slash
        let mut base_url = options.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            max_retries: options.max_retries,
            retry_backoff: options.retry_backoff,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of an endpoint
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        self.base_url
            .join(endpoint)
            .map_err(|e| EtlError::SourceUnavailable {
                endpoint: endpoint.to_string(),
                message: format!("invalid endpoint URL: {}", e),
            })
    }

    async fn attempt(
        &self,
        url: Url,
        endpoint: &str,
        params: &[(String, String)],
    ) -> std::result::Result<StatsResponse, Attempt> {
        let unavailable = |message: String| EtlError::SourceUnavailable {
            endpoint: endpoint.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| Attempt::Transient(unavailable(format!("request failed: {}", e))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = unavailable(format!("HTTP {}: {}", status, body));
            return Err(
                if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    Attempt::Transient(error)
                } else {
                    Attempt::Fatal(error)
                },
            );
        }

        response
            .json::<StatsResponse>()
            .await
            .map_err(|e| Attempt::Fatal(unavailable(format!("undecodable response body: {}", e))))
    }
}

impl StatsProvider for StatsClient {
    async fn fetch(&self, endpoint: &str, params: &[(String, String)]) -> Result<StatsResponse> {
        let url = self.endpoint_url(endpoint)?;
        let mut retries = 0;

        loop {
            log::debug!("GET {} {:?}", url, params);
            match self.attempt(url.clone(), endpoint, params).await {
                Ok(response) => {
                    log::trace!(
                        "{} returned {} result set(s)",
                        endpoint,
                        response.result_sets.len()
                    );
                    return Ok(response);
                }
                Err(Attempt::Transient(error)) if retries < self.max_retries => {
                    retries += 1;
                    let wait = self.retry_backoff * retries;
                    log::warn!(
                        "{} (retry {}/{} in {:?})",
                        error,
                        retries,
                        self.max_retries,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(Attempt::Transient(error)) | Err(Attempt::Fatal(error)) => return Err(error),
            }
        }
    }
}

impl fmt::Display for StatsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}
