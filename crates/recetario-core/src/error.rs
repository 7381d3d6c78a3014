//! Error types shared across the workspace.

/// Errors raised by Recetario components.
#[derive(Debug, thiserror::Error)]
pub enum RecetarioError {
    /// A required setting (secret, provider credential) is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document store could not complete the operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The email provider rejected or failed the send.
    #[error("Email error: {0}")]
    Email(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecetarioError>;
