//! Error types for the udns-postman CLI

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for udns-postman operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "Collection never reported version {expected} after {attempts} attempt(s) (last seen: {})",
        observed.as_deref().unwrap_or("nothing")
    )]
    ReadinessTimeout {
        expected: String,
        observed: Option<String>,
        attempts: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

/// Malformed input: bad JSON, schema violations, unusable documents
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{} is not valid JSON: {message}", path.display())]
    InvalidJson { path: PathBuf, message: String },

    #[error("{count} file(s) failed validation")]
    SchemaViolation { count: usize },

    #[error("{} has no display name", .0.display())]
    MissingName(PathBuf),

    #[error("Malformed OpenAPI document: {0}")]
    MalformedOpenApi(String),

    #[error("{count} file(s) need sanitizing. Run `udns-postman sanitize` and commit the result.")]
    DriftDetected { count: usize },
}

/// Postman API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check POSTMAN_API_KEY.")]
    Unauthorized,

    #[error("Access denied. The API key cannot access this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request ({status}): {body}")]
    BadRequest { status: u16, body: String },

    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// True for credential rejections, which no amount of retrying will fix
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to Postman API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Settings file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Environment variable {0} must be set")]
    MissingEnv(&'static str),

    #[error("Invalid release version '{0}'. Expected a semantic version such as v1.2.3")]
    InvalidVersion(String),

    #[error(
        "No release version available. Pass --release-version or set RELEASE_VERSION / GITHUB_REF_NAME."
    )]
    MissingVersion,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
