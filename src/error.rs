use derive_more::Display;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Defines the application's custom error types.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("VM not found: {0}")]
    NotFound(String),
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Prism API error: {0} rejected credentials: status {1}")]
    Auth(PrismError, StatusCode),
    #[error("Prism API error: {0} failed: status {1}, body: {2}")]
    Prism(PrismError, StatusCode, String),
    #[error("Prism API error: {0} returned a malformed response: {1}")]
    MalformedResponse(PrismError, String),

    #[error("Environment error: {0}")]
    Environment(#[from] dotenv::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to set logger: {0}")]
    Logger(#[from] tracing_log::log::SetLoggerError),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tracing::dispatcher::SetGlobalDefaultError),
    #[error("IO error: {0}")]
    InputOutput(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout(error)
        } else {
            Error::Transport(error)
        }
    }
}

/// Represents the Prism API call that produced an error.
///
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PrismError {
    List,
    Create,
    PowerOn,
    Delete,
}
