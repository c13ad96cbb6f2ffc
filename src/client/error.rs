//! Error types for the Gerrit client

use compact_str::CompactString;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response from {endpoint}: {message}")]
    JsonParse {
        endpoint: CompactString,
        message: CompactString,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: CompactString },

    #[error("Configuration error: {0}")]
    Config(CompactString),

    #[error("Invalid {field}: {message}")]
    ConfigValidation {
        field: &'static str,
        message: CompactString,
    },

    #[error("Authentication failed")]
    Authentication,

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: CompactString },

    #[error("Not found: {resource}")]
    NotFound { resource: CompactString },
}

impl ClientError {
    pub fn json_parse(
        endpoint: impl Into<CompactString>,
        message: impl Into<CompactString>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse {
            endpoint: endpoint.into(),
            message: message.into(),
            source,
        }
    }

    pub fn status(status: u16, message: impl Into<CompactString>) -> Self {
        Self::Status { status, message: message.into() }
    }

    pub fn config(message: impl Into<CompactString>) -> Self {
        Self::Config(message.into())
    }

    pub fn config_validation(field: &'static str, message: impl Into<CompactString>) -> Self {
        Self::ConfigValidation { field, message: message.into() }
    }

    pub fn not_found(resource: impl Into<CompactString>) -> Self {
        Self::NotFound { resource: resource.into() }
    }
}
