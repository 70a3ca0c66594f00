//! Error types for the connectivity service

use thiserror::Error;

/// Main error type for the connectivity service
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Certificate read or parse failure, cause preserved
    #[error("{message}")]
    CertificateError {
        message: String,
        #[source]
        source: Box<ConnectivityError>,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConnectivityError {
    /// Wrap a failure while loading a certificate
    pub fn certificate(message: impl Into<String>, source: ConnectivityError) -> Self {
        ConnectivityError::CertificateError {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
