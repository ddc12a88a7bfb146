//! SQLite storage backend

use crate::error::{StorageError, StorageResult};
use crate::migration::Migratable;
use crate::traits::{StorageBackend, StoreTransaction, TxMode};
use amity_core::{Edge, EdgeKind, User, UserId};
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Default time a writer waits on a locked database file
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        data TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS friends (
        user_id TEXT NOT NULL REFERENCES users(id),
        friend_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        PRIMARY KEY (user_id, friend_id)
    );

    CREATE TABLE IF NOT EXISTS blocks (
        user_id TEXT NOT NULL REFERENCES users(id),
        target_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        PRIMARY KEY (user_id, target_id)
    );

    CREATE TABLE IF NOT EXISTS subscriptions (
        user_id TEXT NOT NULL REFERENCES users(id),
        target_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        PRIMARY KEY (user_id, target_id)
    );

    CREATE INDEX IF NOT EXISTS idx_friends_friend ON friends(friend_id);
    CREATE INDEX IF NOT EXISTS idx_blocks_target ON blocks(target_id);
    CREATE INDEX IF NOT EXISTS idx_subscriptions_target ON subscriptions(target_id);
"#;

/// Table and target column holding edges of a kind
fn edge_table(kind: EdgeKind) -> (&'static str, &'static str) {
    match kind {
        EdgeKind::Friend => ("friends", "friend_id"),
        EdgeKind::Block => ("blocks", "target_id"),
        EdgeKind::Subscription => ("subscriptions", "target_id"),
    }
}

/// Runs schema migrations over a borrowed connection
struct SchemaMigrator<'c>(&'c Connection);

impl Migratable for SchemaMigrator<'_> {
    fn get_schema_version(&self) -> StorageResult<u32> {
        self.0.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);",
        )?;
        let version: Option<u32> =
            self.0
                .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    fn set_schema_version(&self, version: u32) -> StorageResult<()> {
        self.0.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![version],
        )?;
        Ok(())
    }

    fn run_migration(&self, version: u32) -> StorageResult<()> {
        match version {
            1 => self
                .0
                .execute_batch(SCHEMA_V1)
                .map_err(|e| StorageError::Migration(format!("v1: {}", e))),
            other => Err(StorageError::Migration(format!("Unknown schema version {}", other))),
        }
    }
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create a SQLite database with a custom busy timeout
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::bootstrap(conn, busy_timeout)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::bootstrap(conn, DEFAULT_BUSY_TIMEOUT)
    }

    fn bootstrap(conn: Connection, busy_timeout: Duration) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(busy_timeout)?;
        SchemaMigrator(&conn).migrate_to_latest()?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply pending schema migrations, returning the resulting version
    pub async fn migrate(&self) -> StorageResult<u32> {
        let conn = self.conn.lock().await;
        SchemaMigrator(&conn).migrate_to_latest()
    }

    pub async fn schema_version(&self) -> StorageResult<u32> {
        let conn = self.conn.lock().await;
        SchemaMigrator(&conn).get_schema_version()
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn initialize(&self) -> StorageResult<()> {
        self.migrate().await?;
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let conn = self.conn.lock().await;
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one == 1)
    }

    async fn begin<'a>(&'a self, mode: TxMode) -> StorageResult<Box<dyn StoreTransaction + 'a>> {
        let conn = self.conn.lock().await;
        let statement = match mode {
            TxMode::ReadOnly => "BEGIN DEFERRED",
            TxMode::ReadWrite => "BEGIN IMMEDIATE",
        };
        conn.execute_batch(statement)
            .map_err(|e| StorageError::Transaction(format!("Failed to begin: {}", e)))?;

        Ok(Box::new(SqliteTransaction {
            conn,
            mode,
            finished: false,
        }))
    }
}

/// Transaction over [`SqliteStorage`]
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    mode: TxMode,
    finished: bool,
}

impl SqliteTransaction<'_> {
    fn ensure_open(&self) -> StorageResult<()> {
        if self.finished {
            return Err(StorageError::Transaction("transaction already finished".into()));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        self.ensure_open()?;
        if self.mode.is_read_only() {
            return Err(StorageError::Transaction("write in read-only transaction".into()));
        }
        Ok(())
    }

    fn query_users(&self, sql: &str, id: &UserId) -> StorageResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![id.to_string()], |row| row.get::<_, String>(0))?;

        let mut users = Vec::new();
        for row in rows {
            let data = row?;
            let user: User = serde_json::from_str(&data)?;
            users.push(user);
        }

        Ok(users)
    }
}

#[async_trait]
impl StoreTransaction for SqliteTransaction<'_> {
    async fn find_user(&mut self, email: &str) -> StorageResult<Option<User>> {
        self.ensure_open()?;
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn insert_user(&mut self, user: &User) -> StorageResult<()> {
        self.ensure_writable()?;
        let data = serde_json::to_string(user)?;

        let result = self.conn.execute(
            "INSERT INTO users (id, email, data) VALUES (?1, ?2, ?3)",
            params![user.id.to_string(), user.email, data],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::DuplicateUser(user.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn has_edge(&mut self, kind: EdgeKind, from: &UserId, to: &UserId) -> StorageResult<bool> {
        self.ensure_open()?;
        let (table, target) = edge_table(kind);
        let sql = format!("SELECT 1 FROM {} WHERE user_id = ?1 AND {} = ?2", table, target);

        let found: Option<i64> = self
            .conn
            .query_row(&sql, params![from.to_string(), to.to_string()], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    async fn insert_edge(&mut self, edge: &Edge) -> StorageResult<bool> {
        self.ensure_writable()?;
        let (table, target) = edge_table(edge.kind);
        let sql = format!(
            "INSERT OR IGNORE INTO {} (user_id, {}, created_at) VALUES (?1, ?2, ?3)",
            table, target
        );

        let changed = self.conn.execute(
            &sql,
            params![
                edge.from.to_string(),
                edge.to.to_string(),
                edge.created_at.to_rfc3339()
            ],
        )?;
        Ok(changed > 0)
    }

    async fn delete_edge(
        &mut self,
        kind: EdgeKind,
        from: &UserId,
        to: &UserId,
    ) -> StorageResult<bool> {
        self.ensure_writable()?;
        let (table, target) = edge_table(kind);
        let sql = format!("DELETE FROM {} WHERE user_id = ?1 AND {} = ?2", table, target);

        let changed = self.conn.execute(&sql, params![from.to_string(), to.to_string()])?;
        Ok(changed > 0)
    }

    async fn outgoing(&mut self, kind: EdgeKind, from: &UserId) -> StorageResult<Vec<User>> {
        self.ensure_open()?;
        let (table, target) = edge_table(kind);
        let sql = format!(
            "SELECT u.data FROM {} e JOIN users u ON u.id = e.{} WHERE e.user_id = ?1 ORDER BY e.rowid",
            table, target
        );
        self.query_users(&sql, from)
    }

    async fn incoming(&mut self, kind: EdgeKind, to: &UserId) -> StorageResult<Vec<User>> {
        self.ensure_open()?;
        let (table, target) = edge_table(kind);
        let sql = format!(
            "SELECT u.data FROM {} e JOIN users u ON u.id = e.user_id WHERE e.{} = ?1 ORDER BY e.rowid",
            table, target
        );
        self.query_users(&sql, to)
    }

    async fn commit(&mut self) -> StorageResult<()> {
        self.ensure_open()?;
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| StorageError::Transaction(format!("Failed to commit: {}", e)))?;
        self.finished = true;
        Ok(())
    }

    async fn rollback(&mut self) -> StorageResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| StorageError::Transaction(format!("Failed to roll back: {}", e)))
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished || self.conn.is_autocommit() {
            return;
        }
        tracing::debug!("Rolling back unfinished SQLite transaction");
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!("Implicit rollback failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::CURRENT_VERSION;

    #[tokio::test]
    async fn test_sqlite_storage() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.initialize().await.unwrap();
        assert!(storage.health_check().await.unwrap());

        let alice = User::new("alice@x.com");
        let bob = User::new("bob@x.com");
        let carol = User::new("carol@x.com");

        let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
        for user in [&alice, &bob, &carol] {
            tx.insert_user(user).await.unwrap();
        }
        let to_carol = Edge::new(EdgeKind::Friend, alice.id.clone(), carol.id.clone());
        let to_bob = Edge::new(EdgeKind::Friend, alice.id.clone(), bob.id.clone());
        assert!(tx.insert_edge(&to_carol).await.unwrap());
        assert!(tx.insert_edge(&to_bob).await.unwrap());
        assert!(!tx.insert_edge(&to_bob).await.unwrap());
        tx.commit().await.unwrap();
        drop(tx);

        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        assert_eq!(tx.find_user("alice@x.com").await.unwrap(), Some(alice.clone()));
        assert!(tx.find_user("nobody@x.com").await.unwrap().is_none());

        // Storage order is insertion order, not email order
        let friends = tx.outgoing(EdgeKind::Friend, &alice.id).await.unwrap();
        assert_eq!(friends, vec![carol.clone(), bob.clone()]);

        let sources = tx.incoming(EdgeKind::Friend, &bob.id).await.unwrap();
        assert_eq!(sources, vec![alice.clone()]);
        assert!(tx.outgoing(EdgeKind::Block, &alice.id).await.unwrap().is_empty());
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_duplicate_user() {
        let storage = SqliteStorage::in_memory().unwrap();
        let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_user(&User::new("a@x.com")).await.unwrap();

        let err = tx.insert_user(&User::new("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateUser(_)));
    }

    #[tokio::test]
    async fn test_sqlite_drop_rolls_back() {
        let storage = SqliteStorage::in_memory().unwrap();

        {
            let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
            tx.insert_user(&User::new("a@x.com")).await.unwrap();
        }

        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        assert!(tx.find_user("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_read_only_rejects_writes() {
        let storage = SqliteStorage::in_memory().unwrap();
        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        let err = tx.insert_user(&User::new("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StorageError::Transaction(_)));
    }

    #[tokio::test]
    async fn test_sqlite_delete_edge() {
        let storage = SqliteStorage::in_memory().unwrap();
        let a = User::new("a@x.com");
        let b = User::new("b@x.com");

        let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_user(&a).await.unwrap();
        tx.insert_user(&b).await.unwrap();
        tx.insert_edge(&Edge::new(EdgeKind::Subscription, a.id.clone(), b.id.clone()))
            .await
            .unwrap();

        assert!(tx.has_edge(EdgeKind::Subscription, &a.id, &b.id).await.unwrap());
        assert!(tx.delete_edge(EdgeKind::Subscription, &a.id, &b.id).await.unwrap());
        assert!(!tx.has_edge(EdgeKind::Subscription, &a.id, &b.id).await.unwrap());
        assert!(!tx.delete_edge(EdgeKind::Subscription, &a.id, &b.id).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_persists_and_migrates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amity.db");
        let alice = User::new("alice@x.com");

        {
            let storage = SqliteStorage::open(&path).unwrap();
            assert_eq!(storage.schema_version().await.unwrap(), CURRENT_VERSION);
            let mut tx = storage.begin(TxMode::ReadWrite).await.unwrap();
            tx.insert_user(&alice).await.unwrap();
            tx.commit().await.unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.migrate().await.unwrap(), CURRENT_VERSION);
        let mut tx = storage.begin(TxMode::ReadOnly).await.unwrap();
        assert_eq!(tx.find_user("alice@x.com").await.unwrap(), Some(alice));
    }
}
