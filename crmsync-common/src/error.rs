//! Common error types for crmsync

use thiserror::Error;

/// Common result type for crmsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across crmsync connectors
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding of stored field values
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A field mapping names a field the entity has no accessor for
    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: &'static str, field: String },

    /// A field exists but cannot be written through a mapping
    #[error("Field '{field}' on {entity} is read-only")]
    ReadOnlyField { entity: &'static str, field: String },

    /// A value could not be coerced into the field's type
    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidFieldValue { field: String, value: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by a mapping or field misconfiguration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::UnknownField { .. }
                | Error::ReadOnlyField { .. }
                | Error::InvalidFieldValue { .. }
        )
    }
}
