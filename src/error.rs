//! Error types for the market overview sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during a single fetch from the upstream provider
///
/// Cloneable so the engine can keep the cause on a stale snapshot.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status code
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Body could not be parsed as a list of market records
    #[error("Decode error: {0}")]
    Decode(String),

    /// Upstream returned a well-formed but empty list
    #[error("Upstream returned no market records")]
    EmptyResult,
}

impl FetchError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Decode(_) => "decode",
            FetchError::EmptyResult => "empty_result",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Errors reported to callers of the engine for contract violations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The engine was stopped and cannot be restarted
    #[error("Engine has been stopped; create a new instance")]
    Stopped,

    /// The operation needs a running engine
    #[error("Engine is not running")]
    NotRunning,
}

/// Errors raised while building an engine configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Quote currency is not a 3-letter code
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Entry limit outside `1..=max`
    #[error("Invalid limit {limit}: must be between 1 and {max}")]
    InvalidLimit { limit: u32, max: u32 },

    /// A duration setting was zero
    #[error("Invalid {0}: must be greater than zero")]
    ZeroDuration(&'static str),

    /// Base URL does not look like an HTTP(S) URL
    #[error("Invalid base URL: {0:?}")]
    InvalidUrl(String),

    /// Environment variable present but unparsable
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    /// Creates an InvalidEnv error
    pub fn invalid_env(var: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var,
            value: value.into(),
        }
    }
}
