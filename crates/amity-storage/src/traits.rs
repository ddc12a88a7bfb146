//! Storage backend trait definitions

use crate::error::StorageResult;
use amity_core::{Edge, EdgeKind, User, UserId};
use async_trait::async_trait;

/// Access mode for a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

impl TxMode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// Trait for storage backend implementations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Close the storage connection
    async fn close(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    /// Open a transaction
    ///
    /// The returned handle must be finished with `commit` or `rollback`.
    /// Dropping it unfinished rolls back.
    async fn begin<'a>(&'a self, mode: TxMode) -> StorageResult<Box<dyn StoreTransaction + 'a>>;
}

/// A unit of work against the user and edge tables
///
/// Reads observe the transaction's own earlier writes.
#[async_trait]
pub trait StoreTransaction: Send {
    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up a user by normalized email
    async fn find_user(&mut self, email: &str) -> StorageResult<Option<User>>;

    /// Insert a new user; fails with `DuplicateUser` if the email is taken
    async fn insert_user(&mut self, user: &User) -> StorageResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Check for a directed edge `from -> to`
    async fn has_edge(&mut self, kind: EdgeKind, from: &UserId, to: &UserId) -> StorageResult<bool>;

    /// Insert a directed edge; returns false if it already existed
    async fn insert_edge(&mut self, edge: &Edge) -> StorageResult<bool>;

    /// Delete a directed edge; returns false if there was nothing to delete
    async fn delete_edge(&mut self, kind: EdgeKind, from: &UserId, to: &UserId)
        -> StorageResult<bool>;

    /// Targets of `from`'s edges of this kind, in insertion order
    async fn outgoing(&mut self, kind: EdgeKind, from: &UserId) -> StorageResult<Vec<User>>;

    /// Sources of edges of this kind pointing at `to`, in insertion order
    async fn incoming(&mut self, kind: EdgeKind, to: &UserId) -> StorageResult<Vec<User>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Completion
    // ─────────────────────────────────────────────────────────────────────────

    async fn commit(&mut self) -> StorageResult<()>;

    async fn rollback(&mut self) -> StorageResult<()>;
}
