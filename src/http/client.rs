//! HTTP client with retry and rate limiting
//!
//! Both harvest endpoints are POST-only JSON APIs of unknown capacity. The
//! client sends each request through the shared rate limiter, retries
//! transient failures with backoff, and sorts every final failure into the
//! crate's taxonomy: a 401 is an auth failure and never retried, any other
//! non-success status keeps a short body excerpt, and a body that is not JSON
//! is a malformed response.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::retry::RetryPolicy;
use crate::auth::BearerToken;
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest response body excerpt kept in status errors
const ERROR_BODY_LIMIT: usize = 300;

/// Settings shared by every request a client sends
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry behavior for transient failures
    pub retry: RetryPolicy,
    /// Token bucket; `None` sends unthrottled
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers added to every request
    pub default_headers: HashMap<String, String>,
    /// `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    /// Start from the defaults
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder(Self::default())
    }
}

/// Fluent construction of an [`HttpClientConfig`]
pub struct HttpClientConfigBuilder(HttpClientConfig);

impl HttpClientConfigBuilder {
    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.0.timeout = timeout;
        self
    }

    /// Retries after the first attempt
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.0.retry.max_retries = retries;
        self
    }

    /// Backoff curve between retries
    pub fn backoff(mut self, kind: BackoffType, initial: Duration, max: Duration) -> Self {
        self.0.retry.backoff = kind;
        self.0.retry.initial_delay = initial;
        self.0.retry.max_delay = max;
        self
    }

    /// Throttle requests with a token bucket
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.0.rate_limit = Some(config);
        self
    }

    /// Send requests unthrottled
    pub fn no_rate_limit(mut self) -> Self {
        self.0.rate_limit = None;
        self
    }

    /// Header sent with every request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.default_headers.insert(key.into(), value.into());
        self
    }

    /// User agent string
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.0.user_agent = agent.into();
        self
    }

    /// Finish the config
    pub fn build(self) -> HttpClientConfig {
        self.0
    }
}

/// What varies between two requests to the same endpoint
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Appended to the query string
    pub query: HashMap<String, String>,
    /// JSON body
    pub body: Option<Value>,
}

impl RequestOptions {
    /// Empty request options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What one attempt produced
enum Attempt {
    /// 2xx response
    Done(Response),
    /// Transient failure; `wait` is the server's requested delay
    Retry { error: Error, wait: Option<Duration> },
    /// Failure that retrying cannot fix
    Fatal(Error),
}

/// HTTP client shared by the search and batch endpoints
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    token: Option<BearerToken>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Client with the given settings
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(config.timeout)
                .user_agent(config.user_agent.as_str())
                .build()?,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            token: None,
            config,
        })
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: BearerToken) {
        self.token = Some(token);
    }

    /// The bearer token, if any
    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// POST and parse the response as JSON.
    ///
    /// A body that is not valid JSON is reported as
    /// [`Error::MalformedResponse`]; failing to read the body is a transport
    /// error.
    pub async fn post_json(&self, url: &str, options: RequestOptions) -> Result<Value> {
        let response = self.send(url, &options).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| Error::malformed(url, e.to_string()))
    }

    /// POST, retrying transient failures
    async fn send(&self, url: &str, options: &RequestOptions) -> Result<Response> {
        let policy = &self.config.retry;

        let mut attempt = 0;
        loop {
            let (error, wait) = match self.attempt(url, options).await {
                Attempt::Done(response) => {
                    debug!(%url, attempt, "request succeeded");
                    return Ok(response);
                }
                Attempt::Fatal(error) => return Err(error),
                Attempt::Retry { error, wait } => (error, wait),
            };

            if attempt >= policy.max_retries {
                return Err(error);
            }
            // a server-requested wait never exceeds the policy's ceiling
            let delay = wait.map_or_else(|| policy.delay(attempt), |w| w.min(policy.max_delay));
            warn!(
                %url,
                "{error}; retry {}/{} in {:?}",
                attempt + 1,
                policy.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One request, classified
    async fn attempt(&self, url: &str, options: &RequestOptions) -> Attempt {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let timeout = self.config.timeout;
        let mut request = self.client.post(url).timeout(timeout);
        for (key, value) in &self.config.default_headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.secret());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Retry {
                    error: Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    },
                    wait: None,
                }
            }
            Err(e) if e.is_connect() => {
                return Attempt::Retry {
                    error: Error::Http(e),
                    wait: None,
                }
            }
            Err(e) => return Attempt::Fatal(Error::Http(e)),
        };

        let status = response.status();
        if status.is_success() {
            return Attempt::Done(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Attempt::Fatal(Error::Unauthorized {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let seconds = retry_after(&response);
                Attempt::Retry {
                    error: Error::RateLimited {
                        retry_after_seconds: seconds,
                    },
                    wait: seconds.map(Duration::from_secs),
                }
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let error = Error::http_status(status.as_u16(), excerpt(&body));
                if error.is_retryable() {
                    Attempt::Retry { error, wait: None }
                } else {
                    Attempt::Fatal(error)
                }
            }
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("retry", &self.config.retry)
            .field("has_token", &self.token.is_some())
            .field("throttled", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Seconds from a `Retry-After` header, if it carries a delay in seconds
fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok()?.trim().parse().ok())
}

/// First few hundred characters of a response body
fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
