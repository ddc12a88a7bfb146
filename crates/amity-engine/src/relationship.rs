//! Relationship mutations: connect, subscribe, block
//!
//! Each operation resolves (and if needed creates) both users, applies the
//! interaction rules between friend, block and subscription edges, and
//! commits everything in one transaction. Repeating an operation that
//! already succeeded changes nothing and succeeds again.

use std::sync::Arc;

use amity_core::{Edge, EdgeKind, Error, Result};
use amity_storage::{StorageBackend, StoreTransaction, TxMode};

use crate::ensure_distinct;
use crate::identity::IdentityResolver;
use crate::scope::complete;

/// Engine for operations that create or remove edges
pub struct RelationshipEngine<S: StorageBackend> {
    storage: Arc<S>,
}

impl<S: StorageBackend> RelationshipEngine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Make two users friends
    ///
    /// Fails with `Conflict` if either user blocks the other and they are
    /// not already friends.
    pub async fn connect(&self, email_a: &str, email_b: &str) -> Result<()> {
        ensure_distinct(email_a, email_b, "Could not connect same email")?;

        let mut tx = self.storage.begin(TxMode::ReadWrite).await?;
        let outcome = connect_in(tx.as_mut(), email_a, email_b).await;
        complete(tx.as_mut(), outcome).await
    }

    /// Record that `requestor` wants updates from `target`
    ///
    /// Refused only when the two are friends and `target` blocks `requestor`.
    pub async fn subscribe(&self, requestor: &str, target: &str) -> Result<()> {
        ensure_distinct(requestor, target, "Could not subscribe to self")?;

        let mut tx = self.storage.begin(TxMode::ReadWrite).await?;
        let outcome = subscribe_in(tx.as_mut(), requestor, target).await;
        complete(tx.as_mut(), outcome).await
    }

    /// Block `target` on behalf of `requestor`
    ///
    /// Between friends this also drops `target`'s subscription to
    /// `requestor`. The friendship itself is left in place.
    pub async fn block(&self, requestor: &str, target: &str) -> Result<()> {
        ensure_distinct(requestor, target, "Could not block self")?;

        let mut tx = self.storage.begin(TxMode::ReadWrite).await?;
        let outcome = block_in(tx.as_mut(), requestor, target).await;
        complete(tx.as_mut(), outcome).await
    }
}

async fn connect_in(tx: &mut (dyn StoreTransaction + '_), email_a: &str, email_b: &str) -> Result<()> {
    let a = IdentityResolver::resolve(&mut *tx, email_a).await?.user;
    let b = IdentityResolver::resolve(&mut *tx, email_b).await?.user;

    if tx.has_edge(EdgeKind::Friend, &a.id, &b.id).await? {
        tracing::debug!("{} and {} are already friends", a.email, b.email);
        return Ok(());
    }

    if tx.has_edge(EdgeKind::Block, &a.id, &b.id).await?
        || tx.has_edge(EdgeKind::Block, &b.id, &a.id).await?
    {
        tracing::debug!("Refusing to connect {} and {}: blocked", a.email, b.email);
        return Err(Error::Conflict("Friend connection are being blocked".to_string()));
    }

    let edge = Edge::new(EdgeKind::Friend, a.id.clone(), b.id.clone());
    tx.insert_edge(&edge).await?;
    tx.insert_edge(&edge.reversed()).await?;

    tracing::info!("Connected {} and {}", a.email, b.email);
    Ok(())
}

async fn subscribe_in(
    tx: &mut (dyn StoreTransaction + '_),
    requestor: &str,
    target: &str,
) -> Result<()> {
    let requestor = IdentityResolver::resolve(&mut *tx, requestor).await?.user;
    let target = IdentityResolver::resolve(&mut *tx, target).await?.user;

    if tx.has_edge(EdgeKind::Friend, &requestor.id, &target.id).await?
        && tx.has_edge(EdgeKind::Block, &target.id, &requestor.id).await?
    {
        tracing::debug!(
            "Refusing subscription {} -> {}: blocked by target",
            requestor.email,
            target.email
        );
        return Err(Error::Conflict("Requestor is being blocked by target".to_string()));
    }

    let edge = Edge::new(EdgeKind::Subscription, requestor.id, target.id);
    if tx.insert_edge(&edge).await? {
        tracing::info!("Subscribed {} to {}", requestor.email, target.email);
    }
    Ok(())
}

async fn block_in(tx: &mut (dyn StoreTransaction + '_), requestor: &str, target: &str) -> Result<()> {
    let requestor = IdentityResolver::resolve(&mut *tx, requestor).await?.user;
    let target = IdentityResolver::resolve(&mut *tx, target).await?.user;

    let edge = Edge::new(EdgeKind::Block, requestor.id.clone(), target.id.clone());
    if tx.insert_edge(&edge).await? {
        tracing::info!("{} blocked {}", requestor.email, target.email);
    }

    if tx.has_edge(EdgeKind::Friend, &requestor.id, &target.id).await?
        && tx
            .delete_edge(EdgeKind::Subscription, &target.id, &requestor.id)
            .await?
    {
        tracing::info!(
            "Removed subscription {} -> {} after block",
            target.email,
            requestor.email
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amity_core::ErrorKind;
    use amity_storage::MemoryStorage;

    async fn edge_exists(storage: &MemoryStorage, kind: EdgeKind, from: &str, to: &str) -> bool {
        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        let from = tx.find_user(from).await.unwrap().unwrap();
        let to = tx.find_user(to).await.unwrap().unwrap();
        tx.has_edge(kind, &from.id, &to.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_writes_both_directions() {
        let storage = Arc::new(MemoryStorage::new());
        let engine = RelationshipEngine::new(storage.clone());

        engine.connect("A@x.com", "b@x.com ").await.unwrap();

        assert!(edge_exists(&storage, EdgeKind::Friend, "a@x.com", "b@x.com").await);
        assert!(edge_exists(&storage, EdgeKind::Friend, "b@x.com", "a@x.com").await);
    }

    #[tokio::test]
    async fn test_self_reference_rejected() {
        let engine = RelationshipEngine::new(Arc::new(MemoryStorage::new()));

        let err = engine.connect("a@x.com", " A@X.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.messages(), vec!["Could not connect same email"]);

        let err = engine.subscribe("a@x.com", "a@x.com").await.unwrap_err();
        assert_eq!(err.messages(), vec!["Could not subscribe to self"]);

        let err = engine.block("a@x.com", "a@x.com").await.unwrap_err();
        assert_eq!(err.messages(), vec!["Could not block self"]);
    }

    #[tokio::test]
    async fn test_block_removes_targets_subscription_between_friends() {
        let storage = Arc::new(MemoryStorage::new());
        let engine = RelationshipEngine::new(storage.clone());

        engine.connect("a@x.com", "b@x.com").await.unwrap();
        engine.subscribe("b@x.com", "a@x.com").await.unwrap();
        engine.subscribe("a@x.com", "b@x.com").await.unwrap();

        engine.block("a@x.com", "b@x.com").await.unwrap();

        assert!(edge_exists(&storage, EdgeKind::Block, "a@x.com", "b@x.com").await);
        assert!(!edge_exists(&storage, EdgeKind::Subscription, "b@x.com", "a@x.com").await);
        // The blocker's own subscription and the friendship survive
        assert!(edge_exists(&storage, EdgeKind::Subscription, "a@x.com", "b@x.com").await);
        assert!(edge_exists(&storage, EdgeKind::Friend, "a@x.com", "b@x.com").await);
    }

    #[tokio::test]
    async fn test_block_keeps_subscription_between_strangers() {
        let storage = Arc::new(MemoryStorage::new());
        let engine = RelationshipEngine::new(storage.clone());

        engine.subscribe("b@x.com", "a@x.com").await.unwrap();
        engine.block("a@x.com", "b@x.com").await.unwrap();

        assert!(edge_exists(&storage, EdgeKind::Subscription, "b@x.com", "a@x.com").await);
    }

    #[tokio::test]
    async fn test_subscribe_refused_between_friends_when_blocked() {
        let engine = RelationshipEngine::new(Arc::new(MemoryStorage::new()));

        engine.connect("a@x.com", "b@x.com").await.unwrap();
        engine.block("b@x.com", "a@x.com").await.unwrap();

        let err = engine.subscribe("a@x.com", "b@x.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.messages(), vec!["Requestor is being blocked by target"]);

        // The blocker may still subscribe to the user it blocked
        engine.subscribe("b@x.com", "a@x.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_allowed_when_blocked_but_not_friends() {
        let storage = Arc::new(MemoryStorage::new());
        let engine = RelationshipEngine::new(storage.clone());

        engine.block("b@x.com", "a@x.com").await.unwrap();
        engine.subscribe("a@x.com", "b@x.com").await.unwrap();

        assert!(edge_exists(&storage, EdgeKind::Subscription, "a@x.com", "b@x.com").await);
    }
}
