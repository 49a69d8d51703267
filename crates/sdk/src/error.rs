//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    /// The server answered with `success: false`
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not logged in")]
    NotAuthenticated,

    /// Local editor-session failure (tree edit rejected, no file open, ...)
    #[error("Session error: {0}")]
    Session(String),
}

impl From<catalyx_core::domain::DomainError> for SdkError {
    fn from(e: catalyx_core::domain::DomainError) -> Self {
        SdkError::Session(e.to_string())
    }
}

impl SdkError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
