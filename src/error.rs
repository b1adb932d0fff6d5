use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures while obtaining the release catalog.
///
/// Every variant is fatal to a run: the catalog is a pre-flight dependency.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog from {location}: {reason}")]
    Parse { location: String, reason: String },

    #[error("catalog fetch from {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to fetch catalog from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("catalog location is neither a local file nor an http(s) URL: {0}")]
    InvalidLocation(String),
}

impl CatalogError {
    /// HTTP status carried by the failure, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Fetch { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("no active session with the management endpoint")]
    NotConnected,

    #[error("no connected hosts found{}", scope.as_deref().map(|s| format!(" under {s}")).unwrap_or_default())]
    EmptyHostSet { scope: Option<String> },

    #[error("tag service {operation} failed{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    TagService {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("inventory query failed{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Inventory {
        status: Option<u16>,
        message: String,
    },

    #[error("build {build} has no catalog entry")]
    UnmappedBuild { build: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("{failed} of {total} hosts could not be tagged")]
    HostFailures { failed: usize, total: usize },

    #[error("run did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a tag-service failure without an HTTP status.
    pub fn tag_service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::TagService {
            operation,
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status behind this error, when the failure came off the wire.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TagService { status, .. } | Self::Inventory { status, .. } => *status,
            Self::Catalog(err) => err.status(),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
