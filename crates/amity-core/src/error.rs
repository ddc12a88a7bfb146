//! Error types for Amity Core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using Amity's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    Conflict,
    NotFound,
    StoreError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::StoreError => "store_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amity error types
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected by a validation or self-reference rule
    #[error("Invalid request: {}", .0.join("; "))]
    InvalidRequest(Vec<String>),

    /// A relationship rule prevents the operation
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Shorthand for an `InvalidRequest` carrying a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(vec![message.into()])
    }

    pub fn user_not_found(email: &str) -> Self {
        Self::NotFound(format!("User with email {} does not exist", email))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::StoreError,
        }
    }

    /// Human-readable messages, one per problem found
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::InvalidRequest(messages) => messages.clone(),
            Self::Conflict(msg) | Self::NotFound(msg) | Self::Storage(msg) => vec![msg.clone()],
        }
    }
}
