//! Amity Storage - Transactional edge stores
//!
//! This crate provides the storage backends the engines run their
//! units of work against.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod memory;
pub mod migration;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use migration::{Migratable, SchemaVersion, CURRENT_VERSION};
pub use traits::{StorageBackend, StoreTransaction, TxMode};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
