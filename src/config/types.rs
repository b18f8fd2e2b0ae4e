//! Job file types
//!
//! Rust types mirroring the YAML job file. Every section has serde defaults
//! so a job file only needs the two endpoint URLs.

use crate::auth::BearerToken;
use crate::error::{Error, Result};
use crate::flatten::FlattenConfig;
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::output::{OutputFormat, ParquetWriterConfig};
use crate::pagination::ProbeConfig;
use crate::resolve::BatchConfig;
use crate::search::{IdFields, SearchCriteria};
use crate::types::{BackoffType, BlankAsNone, ParamLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable read for the credential when the job file names none
pub const DEFAULT_TOKEN_ENV: &str = "RECORDHARVEST_TOKEN";

/// Complete harvest job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Job name, used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// Search endpoint and probing settings
    pub search: SearchConfig,

    /// Batch-fetch endpoint settings
    pub batch: BatchConfig,

    /// Credential settings
    #[serde(default)]
    pub auth: AuthSettings,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Flattening settings
    #[serde(default)]
    pub flatten: FlattenConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputSettings,
}

fn default_name() -> String {
    "harvest".to_string()
}

/// Search endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL
    pub url: String,

    /// Filter sent with every search request
    #[serde(default)]
    pub criteria: SearchCriteria,

    /// Id fields on elements of a top-level result array
    #[serde(default = "default_record_id_fields")]
    pub id_fields: Vec<String>,

    /// Id fields on `hits.hits` entries
    #[serde(default = "default_hit_id_fields")]
    pub hit_id_fields: Vec<String>,

    /// Where size and pagination parameters are sent
    #[serde(default)]
    pub param_location: ParamLocation,

    /// Probing limits and candidate conventions
    #[serde(default)]
    pub pagination: ProbeConfig,
}

fn default_record_id_fields() -> Vec<String> {
    IdFields::default().record
}

fn default_hit_id_fields() -> Vec<String> {
    IdFields::default().hit
}

impl SearchConfig {
    /// Create search settings for an endpoint with default everything else
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            criteria: SearchCriteria::default(),
            id_fields: default_record_id_fields(),
            hit_id_fields: default_hit_id_fields(),
            param_location: ParamLocation::default(),
            pagination: ProbeConfig::default(),
        }
    }

    /// Identifier field names for the extractor
    pub fn extractor_fields(&self) -> IdFields {
        IdFields {
            record: self.id_fields.clone(),
            hit: self.hit_id_fields.clone(),
        }
    }
}

/// Credential settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Bearer token written in the job file
    pub token: Option<String>,
    /// Environment variable holding the token
    pub token_env: String,
    /// Refuse to start with a JWT whose `exp` has passed
    pub check_expiry: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            check_expiry: true,
        }
    }
}

impl AuthSettings {
    /// Resolve the credential: explicit override, then the job file, then
    /// the environment variable. `None` means the run is unauthenticated.
    pub fn resolve_token(&self, token_override: Option<&str>) -> Result<Option<BearerToken>> {
        let from_env = std::env::var(&self.token_env).ok();
        let raw = token_override
            .map(str::to_string)
            .none_if_blank()
            .or_else(|| self.token.clone().none_if_blank())
            .or_else(|| from_env.none_if_blank());

        raw.map(BearerToken::new).transpose()
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Growth of the delay between retries
    pub backoff: BackoffType,
    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
    /// Ceiling on any retry delay, including a server's `Retry-After`
    pub max_backoff_ms: u64,
    /// Request rate; 0 disables rate limiting
    pub requests_per_second: u32,
    /// Token bucket burst size
    pub burst_size: u32,
    /// Custom user agent
    pub user_agent: Option<String>,
    /// Headers added to every request
    pub headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let limits = RateLimiterConfig::default();
        Self {
            timeout_secs: 30,
            max_retries: 2,
            backoff: BackoffType::default(),
            initial_backoff_ms: 250,
            max_backoff_ms: 30_000,
            requests_per_second: limits.requests_per_second,
            burst_size: limits.burst_size,
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

impl HttpSettings {
    /// Build the client configuration
    pub fn client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            );

        builder = if self.requests_per_second == 0 {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::new(
                self.requests_per_second,
                self.burst_size,
            ))
        };

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

/// Output file settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Destination file
    pub path: Option<PathBuf>,
    /// File format; guessed from the extension when unset
    pub format: Option<OutputFormat>,
    /// Parquet writer settings
    pub parquet: ParquetWriterConfig,
}

impl OutputSettings {
    /// Format to write, falling back to the path's extension and then CSV
    pub fn resolved_format(&self) -> OutputFormat {
        self.format
            .or_else(|| self.path.as_ref().and_then(OutputFormat::from_path))
            .unwrap_or_default()
    }

    /// Destination path, or an error when none is configured
    pub fn require_path(&self) -> Result<&PathBuf> {
        self.path
            .as_ref()
            .ok_or_else(|| Error::config("No output path: set output.path or pass --output"))
    }
}
