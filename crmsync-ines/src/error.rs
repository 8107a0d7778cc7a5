//! Error types for crmsync-ines

use thiserror::Error;

/// Result type for connector operations
pub type IntegrationResult<T> = std::result::Result<T, IntegrationError>;

/// Connector error
///
/// Remote failures are never retried or swallowed by the connector; they
/// propagate to the caller of the batch.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service answered with a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session login rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response decoded but lacked an expected result
    #[error("Missing result in {operation} response: {detail}")]
    MissingResult {
        operation: &'static str,
        detail: String,
    },

    /// Connector configuration is incomplete or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local store, field access or mapping error
    #[error(transparent)]
    Common(#[from] crmsync_common::Error),
}

impl IntegrationError {
    /// True for failures of the remote service or its transport
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            IntegrationError::Network(_)
                | IntegrationError::Api(..)
                | IntegrationError::Parse(_)
                | IntegrationError::Auth(_)
                | IntegrationError::MissingResult { .. }
        )
    }

    /// True for mapping or field misconfiguration
    pub fn is_configuration(&self) -> bool {
        match self {
            IntegrationError::Config(_) => true,
            IntegrationError::Common(err) => err.is_configuration(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IntegrationError::Parse(err.to_string())
        } else {
            IntegrationError::Network(err.to_string())
        }
    }
}
