//! Storage error types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate user: {0}")]
    DuplicateUser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] ::rusqlite::Error),
}

impl From<StorageError> for amity_core::Error {
    fn from(err: StorageError) -> Self {
        amity_core::Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amity_core::ErrorKind;

    #[test]
    fn test_converts_to_store_error() {
        let err: amity_core::Error = StorageError::Transaction("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::StoreError);
        assert_eq!(err.messages(), vec!["Transaction error: boom"]);
    }
}
