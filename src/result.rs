use std::path::PathBuf;

use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    #[error("Authentication with the review server failed.")]
    Authentication,

    #[error("The review server did not answer in time.")]
    Timeout,

    #[error("The tracker is no longer running.")]
    Stopped,

    #[error("Failed to load configuration from: {path}")]
    ConfigLoadError { path: PathBuf, message: String },

    #[error("Failed to save configuration to: {path}")]
    ConfigSaveError { path: PathBuf, message: String },

    #[error("Invalid configuration: {field}")]
    ConfigValidationError { field: String, message: String },

    #[error("Could not decode response from {endpoint}: {message}")]
    DecodeError {
        endpoint: CompactString,
        message: CompactString,
    },

    #[error("{0}")]
    TransportError(CompactString),

    #[error("{0}")]
    GeneralError(CompactString),
}

impl From<&ClientError> for TrackerError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Http(e) => {
                TrackerError::TransportError(format!("HTTP error: {e}").into())
            },
            ClientError::JsonParse { endpoint, source, .. } => TrackerError::DecodeError {
                endpoint: endpoint.clone(),
                message: source.to_compact_string(),
            },
            ClientError::Status { .. } | ClientError::NotFound { .. } => {
                TrackerError::TransportError(err.to_compact_string())
            },
            ClientError::Authentication => TrackerError::Authentication,
            ClientError::Timeout => TrackerError::Timeout,
            ClientError::Config(msg) => TrackerError::GeneralError(msg.clone()),
            ClientError::ConfigValidation { field, message } => {
                TrackerError::config_validation_error(*field, message.as_str())
            },
            ClientError::InvalidUrl { url } => {
                TrackerError::GeneralError(format!("Invalid URL: {url}").into())
            },
        }
    }
}

impl From<ClientError> for TrackerError {
    fn from(e: ClientError) -> Self {
        TrackerError::from(&e)
    }
}

impl TrackerError {
    /// Create a configuration load error
    pub fn config_load_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigLoadError { path, message: source.to_string() }
    }

    /// Create a configuration save error
    pub fn config_save_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigSaveError { path, message: source.to_string() }
    }

    /// Create a configuration validation error
    pub fn config_validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidationError { field: field.into(), message: message.into() }
    }
}
