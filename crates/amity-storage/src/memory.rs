//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::{StorageBackend, StoreTransaction, TxMode};
use amity_core::{Edge, EdgeKind, User, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    by_email: HashMap<String, usize>,
    by_id: HashMap<UserId, usize>,
    edges: HashMap<EdgeKind, Vec<(UserId, UserId)>>,
}

impl MemoryState {
    fn user(&self, id: &UserId) -> Option<&User> {
        self.by_id.get(id).map(|&idx| &self.users[idx])
    }

    fn edges(&self, kind: EdgeKind) -> &[(UserId, UserId)] {
        self.edges.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// In-memory storage backend
///
/// Transactions take an exclusive lock for their whole lifetime. Writes go
/// to a staged copy that replaces the live state on commit.
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn begin<'a>(&'a self, mode: TxMode) -> StorageResult<Box<dyn StoreTransaction + 'a>> {
        let guard = self.state.lock().await;
        let staged = match mode {
            TxMode::ReadOnly => None,
            TxMode::ReadWrite => Some(guard.clone()),
        };

        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            finished: false,
        }))
    }
}

/// Transaction over [`MemoryStorage`]
pub struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, MemoryState>,
    staged: Option<MemoryState>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn view(&self) -> StorageResult<&MemoryState> {
        if self.finished {
            return Err(StorageError::Transaction("transaction already finished".into()));
        }
        Ok(self.staged.as_ref().unwrap_or(&*self.guard))
    }

    fn view_mut(&mut self) -> StorageResult<&mut MemoryState> {
        if self.finished {
            return Err(StorageError::Transaction("transaction already finished".into()));
        }
        self.staged
            .as_mut()
            .ok_or_else(|| StorageError::Transaction("write in read-only transaction".into()))
    }

    fn collect_users<'s>(
        state: &MemoryState,
        ids: impl Iterator<Item = &'s UserId>,
    ) -> StorageResult<Vec<User>> {
        ids.map(|id| {
            state
                .user(id)
                .cloned()
                .ok_or_else(|| StorageError::Database(format!("Dangling edge to user {}", id)))
        })
        .collect()
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction<'_> {
    async fn find_user(&mut self, email: &str) -> StorageResult<Option<User>> {
        let state = self.view()?;
        Ok(state.by_email.get(email).map(|&idx| state.users[idx].clone()))
    }

    async fn insert_user(&mut self, user: &User) -> StorageResult<()> {
        let state = self.view_mut()?;
        if state.by_email.contains_key(&user.email) {
            return Err(StorageError::DuplicateUser(user.email.clone()));
        }

        let idx = state.users.len();
        state.users.push(user.clone());
        state.by_email.insert(user.email.clone(), idx);
        state.by_id.insert(user.id.clone(), idx);
        Ok(())
    }

    async fn has_edge(&mut self, kind: EdgeKind, from: &UserId, to: &UserId) -> StorageResult<bool> {
        let state = self.view()?;
        Ok(state.edges(kind).iter().any(|(f, t)| f == from && t == to))
    }

    async fn insert_edge(&mut self, edge: &Edge) -> StorageResult<bool> {
        let state = self.view_mut()?;
        if state.user(&edge.from).is_none() || state.user(&edge.to).is_none() {
            return Err(StorageError::Database(format!(
                "Edge references unknown user: {} -> {}",
                edge.from, edge.to
            )));
        }

        let rows = state.edges.entry(edge.kind).or_default();
        if rows.iter().any(|(f, t)| *f == edge.from && *t == edge.to) {
            return Ok(false);
        }
        rows.push((edge.from.clone(), edge.to.clone()));
        Ok(true)
    }

    async fn delete_edge(
        &mut self,
        kind: EdgeKind,
        from: &UserId,
        to: &UserId,
    ) -> StorageResult<bool> {
        let state = self.view_mut()?;
        let Some(rows) = state.edges.get_mut(&kind) else {
            return Ok(false);
        };

        let before = rows.len();
        rows.retain(|(f, t)| !(f == from && t == to));
        Ok(rows.len() != before)
    }

    async fn outgoing(&mut self, kind: EdgeKind, from: &UserId) -> StorageResult<Vec<User>> {
        let state = self.view()?;
        let targets = state
            .edges(kind)
            .iter()
            .filter(|(f, _)| f == from)
            .map(|(_, t)| t);
        Self::collect_users(state, targets)
    }

    async fn incoming(&mut self, kind: EdgeKind, to: &UserId) -> StorageResult<Vec<User>> {
        let state = self.view()?;
        let sources = state
            .edges(kind)
            .iter()
            .filter(|(_, t)| t == to)
            .map(|(f, _)| f);
        Self::collect_users(state, sources)
    }

    async fn commit(&mut self) -> StorageResult<()> {
        if self.finished {
            return Err(StorageError::Transaction("transaction already finished".into()));
        }
        if let Some(staged) = self.staged.take() {
            *self.guard = staged;
        }
        self.finished = true;
        Ok(())
    }

    async fn rollback(&mut self) -> StorageResult<()> {
        self.staged = None;
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && self.staged.is_some() {
            tracing::debug!("Discarding unfinished memory transaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.initialize().await.unwrap();

        let alice = User::new("alice@x.com");
        let bob = User::new("bob@x.com");

        let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_user(&alice).await.unwrap();
        tx.insert_user(&bob).await.unwrap();
        let edge = Edge::new(EdgeKind::Friend, alice.id.clone(), bob.id.clone());
        assert!(tx.insert_edge(&edge).await.unwrap());
        assert!(!tx.insert_edge(&edge).await.unwrap());
        tx.commit().await.unwrap();
        drop(tx);

        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        let found = tx.find_user("alice@x.com").await.unwrap();
        assert_eq!(found, Some(alice.clone()));
        assert!(tx.has_edge(EdgeKind::Friend, &alice.id, &bob.id).await.unwrap());
        assert!(!tx.has_edge(EdgeKind::Friend, &bob.id, &alice.id).await.unwrap());

        let friends = tx.outgoing(EdgeKind::Friend, &alice.id).await.unwrap();
        assert_eq!(friends, vec![bob.clone()]);
        let sources = tx.incoming(EdgeKind::Friend, &bob.id).await.unwrap();
        assert_eq!(sources, vec![alice]);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let storage = MemoryStorage::new();

        let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_user(&User::new("a@x.com")).await.unwrap();
        assert!(tx.find_user("a@x.com").await.unwrap().is_some());
        tx.rollback().await.unwrap();
        drop(tx);

        {
            let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
            tx.insert_user(&User::new("b@x.com")).await.unwrap();
        }

        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        assert!(tx.find_user("a@x.com").await.unwrap().is_none());
        assert!(tx.find_user("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let storage = MemoryStorage::new();
        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        let err = tx.insert_user(&User::new("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StorageError::Transaction(_)));
    }

    #[tokio::test]
    async fn test_duplicate_user_and_delete_edge() {
        let storage = MemoryStorage::new();
        let a = User::new("a@x.com");
        let b = User::new("b@x.com");

        let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_user(&a).await.unwrap();
        tx.insert_user(&b).await.unwrap();
        assert!(matches!(
            tx.insert_user(&User::new("a@x.com")).await,
            Err(StorageError::DuplicateUser(_))
        ));

        let sub = Edge::new(EdgeKind::Subscription, a.id.clone(), b.id.clone());
        tx.insert_edge(&sub).await.unwrap();
        assert!(tx.delete_edge(EdgeKind::Subscription, &a.id, &b.id).await.unwrap());
        assert!(!tx.delete_edge(EdgeKind::Subscription, &a.id, &b.id).await.unwrap());
        assert!(!tx.delete_edge(EdgeKind::Block, &a.id, &b.id).await.unwrap());
        tx.commit().await.unwrap();
        assert!(tx.commit().await.is_err());
    }
}
