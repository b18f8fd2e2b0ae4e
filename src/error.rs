//! Error types for recordharvest
//!
//! Variants are grouped by the [`FailureKind`] they belong to. The pipeline
//! branches on the kind (auth failures are always fatal, transport failures
//! are fatal except while probing a pagination convention) and the CLI turns
//! it into the process exit code.

use thiserror::Error;

/// Every failure the harvest can report
#[derive(Error, Debug)]
pub enum Error {
    // ------------------------------------------------------------------
    // Job definition
    // ------------------------------------------------------------------
    #[error("invalid job: {message}")]
    Config { message: String },

    #[error("invalid job field `{field}`: {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("job file is not valid YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("bad URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An error annotated while loading the job
    #[error("{message}: {source}")]
    Context {
        message: String,
        source: Box<Error>,
    },

    // ------------------------------------------------------------------
    // Credential
    // ------------------------------------------------------------------
    #[error("{url} rejected the credential (HTTP {status}); the token is invalid or expired")]
    Unauthorized { url: String, status: u16 },

    #[error("credential expired at {expired_at}; supply a fresh token")]
    CredentialExpired { expired_at: String },

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ------------------------------------------------------------------
    // Unexpected status
    // ------------------------------------------------------------------
    #[error("server answered HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error(
        "server is throttling requests{}",
        .retry_after_seconds.map(|secs| format!(" (retry after {secs}s)")).unwrap_or_default()
    )]
    RateLimited { retry_after_seconds: Option<u64> },

    // ------------------------------------------------------------------
    // Payload
    // ------------------------------------------------------------------
    #[error("unexpected response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------
    #[error("could not build record batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("could not write parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("could not write output: {message}")]
    Output { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad job file, bad flag, missing credential
    Config,
    /// Network-level error or timeout
    Transport,
    /// Credential rejected or expired
    Auth,
    /// Non-success HTTP status other than an auth rejection
    UnexpectedStatus,
    /// Body not parseable or not shaped as expected
    MalformedResponse,
    /// Writing the dataset failed
    Output,
}

impl FailureKind {
    /// Process exit code for this kind of failure
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::Config => 1,
            FailureKind::Transport => 2,
            FailureKind::Auth => 3,
            FailureKind::UnexpectedStatus => 4,
            FailureKind::MalformedResponse => 5,
            FailureKind::Output => 6,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FailureKind::Config => "configuration",
            FailureKind::Transport => "transport",
            FailureKind::Auth => "authorization",
            FailureKind::UnexpectedStatus => "unexpected status",
            FailureKind::MalformedResponse => "malformed response",
            FailureKind::Output => "output",
        })
    }
}

impl Error {
    /// Job-level error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// A single job field is unusable
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Non-success status with a body excerpt
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Response that parsed but is not what the endpoint should return
    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Dataset could not be written
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Config { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::InvalidUrl(_)
            | Error::Context { .. } => FailureKind::Config,
            Error::Unauthorized { .. } | Error::CredentialExpired { .. } => FailureKind::Auth,
            Error::Http(_) | Error::Timeout { .. } => FailureKind::Transport,
            Error::HttpStatus { .. } | Error::RateLimited { .. } => FailureKind::UnexpectedStatus,
            Error::MalformedResponse { .. } | Error::JsonParse(_) => {
                FailureKind::MalformedResponse
            }
            Error::Arrow(_) | Error::Parquet(_) | Error::Output { .. } | Error::Io(_) => {
                FailureKind::Output
            }
        }
    }

    /// Check if this is an authorization failure
    pub fn is_auth(&self) -> bool {
        self.kind() == FailureKind::Auth
    }

    /// Whether the same request might succeed if sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout { .. } | Error::RateLimited { .. } => true,
            Error::HttpStatus { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Result type alias for recordharvest
pub type Result<T> = std::result::Result<T, Error>;

/// Annotate errors raised while loading a job.
///
/// The annotated error always classifies as [`FailureKind::Config`]: an
/// unreadable or unparseable job file is a configuration problem whatever
/// the underlying cause.
pub trait ResultExt<T> {
    /// Prefix the error with a fixed message
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Prefix the error with a lazily built message
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.with_context(|| message.into())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Context {
            message: f(),
            source: Box::new(e.into()),
        })
    }
}
