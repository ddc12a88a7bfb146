//! Read-side derivations over the relationship graph

use std::sync::Arc;

use amity_core::{extract_mentions, intersect, EdgeKind, RecipientSet, Result, User};
use amity_storage::{StorageBackend, StoreTransaction, TxMode};
use serde::{Deserialize, Serialize};

use crate::ensure_distinct;
use crate::identity::IdentityResolver;
use crate::scope::{complete, release};

/// A list of friend emails with its length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendList {
    pub friends: Vec<String>,
    pub count: usize,
}

impl FriendList {
    pub fn new(friends: Vec<String>) -> Self {
        let count = friends.len();
        Self { friends, count }
    }
}

/// Engine for friend lists, common friends and notification recipients
pub struct QueryEngine<S: StorageBackend> {
    storage: Arc<S>,
}

impl<S: StorageBackend> QueryEngine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Friends of a known user, in storage order
    pub async fn get_friends(&self, email: &str) -> Result<FriendList> {
        let mut tx = self.storage.begin(TxMode::ReadOnly).await?;
        let outcome = friends_in(tx.as_mut(), email).await.map(FriendList::new);
        release(tx.as_mut(), outcome).await
    }

    /// Friends shared by two known users, in the first user's order
    pub async fn get_common_friends(&self, email_a: &str, email_b: &str) -> Result<FriendList> {
        ensure_distinct(
            email_a,
            email_b,
            "Could not get common friend list from same email address",
        )?;

        let mut tx = self.storage.begin(TxMode::ReadOnly).await?;
        let outcome = common_friends_in(tx.as_mut(), email_a, email_b)
            .await
            .map(FriendList::new);
        release(tx.as_mut(), outcome).await
    }

    /// Everyone who should receive an update posted by `sender`
    ///
    /// Friends come first, then subscribers, then addresses mentioned in
    /// `text`; each address appears once. Users blocking the sender are
    /// removed. An unknown sender is created, and only then is anything
    /// committed.
    pub async fn get_notification_recipients(&self, sender: &str, text: &str) -> Result<Vec<String>> {
        let mut tx = self.storage.begin(TxMode::ReadWrite).await?;
        let outcome = recipients_in(tx.as_mut(), sender, text).await;

        match outcome {
            Ok((recipients, true)) => complete(tx.as_mut(), Ok(recipients)).await,
            other => release(tx.as_mut(), other.map(|(recipients, _)| recipients)).await,
        }
    }
}

fn emails(users: Vec<User>) -> Vec<String> {
    users.into_iter().map(|u| u.email).collect()
}

async fn friends_in(tx: &mut (dyn StoreTransaction + '_), email: &str) -> Result<Vec<String>> {
    let user = IdentityResolver::require(&mut *tx, email).await?;
    let friends = tx.outgoing(EdgeKind::Friend, &user.id).await?;
    tracing::debug!("{} has {} friends", user.email, friends.len());
    Ok(emails(friends))
}

async fn common_friends_in(
    tx: &mut (dyn StoreTransaction + '_),
    email_a: &str,
    email_b: &str,
) -> Result<Vec<String>> {
    let a = IdentityResolver::require(&mut *tx, email_a).await?;
    let b = IdentityResolver::require(&mut *tx, email_b).await?;

    let friends_a = emails(tx.outgoing(EdgeKind::Friend, &a.id).await?);
    let friends_b = emails(tx.outgoing(EdgeKind::Friend, &b.id).await?);
    Ok(intersect(&friends_a, &friends_b))
}

/// Returns the recipients and whether the sender was created
async fn recipients_in(
    tx: &mut (dyn StoreTransaction + '_),
    sender: &str,
    text: &str,
) -> Result<(Vec<String>, bool)> {
    let resolved = IdentityResolver::resolve(&mut *tx, sender).await?;
    let sender = resolved.user;

    let friends = tx.outgoing(EdgeKind::Friend, &sender.id).await?;
    let subscribers = tx.incoming(EdgeKind::Subscription, &sender.id).await?;
    let mentions = extract_mentions(text);

    let mut recipients = RecipientSet::new();
    recipients.extend(emails(friends));
    recipients.extend(emails(subscribers));
    recipients.extend(mentions);

    let blockers = emails(tx.incoming(EdgeKind::Block, &sender.id).await?);
    recipients.exclude(blockers.iter().map(String::as_str));

    tracing::debug!(
        "{} recipients for update from {} ({} blocking)",
        recipients.len(),
        sender.email,
        blockers.len()
    );
    Ok((recipients.into_vec(), resolved.created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipEngine;
    use amity_core::ErrorKind;
    use amity_storage::MemoryStorage;

    fn engines() -> (
        Arc<MemoryStorage>,
        RelationshipEngine<MemoryStorage>,
        QueryEngine<MemoryStorage>,
    ) {
        let storage = Arc::new(MemoryStorage::new());
        (
            storage.clone(),
            RelationshipEngine::new(storage.clone()),
            QueryEngine::new(storage),
        )
    }

    #[tokio::test]
    async fn test_get_friends() {
        let (_, relations, queries) = engines();
        relations.connect("a@x.com", "b@x.com").await.unwrap();
        relations.connect("a@x.com", "c@x.com").await.unwrap();

        let list = queries.get_friends("A@x.com").await.unwrap();
        assert_eq!(list, FriendList::new(vec!["b@x.com".into(), "c@x.com".into()]));
        assert_eq!(list.count, 2);

        let err = queries.get_friends("nobody@x.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_get_common_friends() {
        let (_, relations, queries) = engines();
        relations.connect("a@x.com", "c@x.com").await.unwrap();
        relations.connect("a@x.com", "d@x.com").await.unwrap();
        relations.connect("b@x.com", "d@x.com").await.unwrap();
        relations.connect("b@x.com", "c@x.com").await.unwrap();
        relations.connect("b@x.com", "e@x.com").await.unwrap();

        let common = queries.get_common_friends("a@x.com", "b@x.com").await.unwrap();
        assert_eq!(common.friends, vec!["c@x.com", "d@x.com"]);
        assert_eq!(common.count, 2);

        let err = queries.get_common_friends("a@x.com", "a@x.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = queries.get_common_friends("a@x.com", "z@x.com").await.unwrap_err();
        assert_eq!(err.messages(), vec!["User with email z@x.com does not exist"]);
    }

    #[tokio::test]
    async fn test_recipients_precedence_and_dedup() {
        let (_, relations, queries) = engines();
        relations.connect("s@x.com", "f1@x.com").await.unwrap();
        relations.connect("s@x.com", "f2@x.com").await.unwrap();
        relations.subscribe("f2@x.com", "s@x.com").await.unwrap();
        relations.subscribe("s1@x.com", "s@x.com").await.unwrap();

        let recipients = queries
            .get_notification_recipients("s@x.com", "hi f1@x.com s2@x.com")
            .await
            .unwrap();
        assert_eq!(recipients, vec!["f1@x.com", "f2@x.com", "s1@x.com", "s2@x.com"]);
    }

    #[tokio::test]
    async fn test_recipients_skip_own_subscriptions() {
        let (_, relations, queries) = engines();
        // s subscribes to t; that makes s a recipient of t, not the reverse
        relations.subscribe("s@x.com", "t@x.com").await.unwrap();

        let recipients = queries.get_notification_recipients("s@x.com", "").await.unwrap();
        assert!(recipients.is_empty());

        let recipients = queries.get_notification_recipients("t@x.com", "").await.unwrap();
        assert_eq!(recipients, vec!["s@x.com"]);
    }

    #[tokio::test]
    async fn test_recipients_exclude_blockers() {
        let (_, relations, queries) = engines();
        relations.connect("s@x.com", "f@x.com").await.unwrap();
        relations.block("f@x.com", "s@x.com").await.unwrap();
        relations.block("m@x.com", "s@x.com").await.unwrap();

        let recipients = queries
            .get_notification_recipients("s@x.com", "ping m@x.com and o@x.com")
            .await
            .unwrap();
        assert_eq!(recipients, vec!["o@x.com"]);
    }

    #[tokio::test]
    async fn test_unknown_sender_is_created() {
        let (_, _, queries) = engines();

        let recipients = queries
            .get_notification_recipients("new@x.com", "hello")
            .await
            .unwrap();
        assert!(recipients.is_empty());

        let list = queries.get_friends("new@x.com").await.unwrap();
        assert_eq!(list.count, 0);
    }
}
