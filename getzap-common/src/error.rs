use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GetZapError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("URL Error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Only secure encrypted HTTPS protocol is allowed, downloads via HTTP are blocked: {0}")]
    InsecureProtocol(String),

    #[error("HTTP error {status} for URL {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Authentication Error: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Artifactory does not cache '{0}' releases, please specify a specific release")]
    UnsupportedCacheQuery(String),

    #[error("Invalid artifactory configuration. You need to provide url, api key and user either via command line, environment variables, or configuration file.")]
    InvalidCredentials,

    #[error("Upload incomplete: {succeeded} succeeded, {failed} failed")]
    PartialUpload { succeeded: usize, failed: usize },

    #[error("Download incomplete: {succeeded} succeeded, {failed} failed")]
    PartialDownload { succeeded: usize, failed: usize },

    #[error("Checksum Error: {0}")]
    ChecksumError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl GetZapError {
    /// Configuration and protocol-safety errors abort a resolution outright.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GetZapError::Config(_)
                | GetZapError::InsecureProtocol(_)
                | GetZapError::InvalidCredentials
                | GetZapError::UnsupportedCacheQuery(_)
        )
    }
}

impl From<std::io::Error> for GetZapError {
    fn from(err: std::io::Error) -> Self {
        GetZapError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for GetZapError {
    fn from(err: reqwest::Error) -> Self {
        GetZapError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for GetZapError {
    fn from(err: serde_json::Error) -> Self {
        GetZapError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, GetZapError>;
