//! Amity Engine - Relationship mutations and graph queries
//!
//! Every operation runs as one transaction against a [`StorageBackend`]
//! handle injected at construction time.
//!
//! [`StorageBackend`]: amity_storage::StorageBackend

pub mod identity;
pub mod query;
pub mod relationship;
mod scope;

pub use identity::{IdentityResolver, Resolved};
pub use query::{FriendList, QueryEngine};
pub use relationship::RelationshipEngine;

use amity_core::{validation::same_identity, Error, Result};

/// Reject requests where both addresses name the same identity
pub(crate) fn ensure_distinct(a: &str, b: &str, message: &str) -> Result<()> {
    if same_identity(a, b) {
        return Err(Error::invalid(message));
    }
    Ok(())
}
