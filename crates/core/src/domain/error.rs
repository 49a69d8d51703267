// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid run job status transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("{0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
