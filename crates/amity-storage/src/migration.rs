//! Schema versions and the forward-only migration driver

use crate::StorageResult;

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

/// One schema step
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    pub version: u32,
    pub description: &'static str,
}

/// Every known schema step, oldest first
pub fn get_migrations() -> Vec<SchemaVersion> {
    vec![SchemaVersion {
        version: 1,
        description: "Users with friend, block and subscription edge tables",
    }]
}

/// Versioned schema management, implemented per backend
pub trait Migratable {
    /// Get the current schema version from storage
    fn get_schema_version(&self) -> StorageResult<u32>;

    /// Set the schema version in storage
    fn set_schema_version(&self, version: u32) -> StorageResult<()>;

    /// Run migrations from current version to target version
    ///
    /// Returns the version the schema ends up at.
    fn migrate_to(&self, target_version: u32) -> StorageResult<u32> {
        let current = self.get_schema_version()?;

        if current == target_version {
            tracing::debug!("Schema already at version {}", target_version);
            return Ok(current);
        }

        if current > target_version {
            tracing::warn!(
                "Schema version {} is newer than target {}. Downgrades not supported.",
                current,
                target_version
            );
            return Ok(current);
        }

        tracing::info!("Migrating schema from v{} to v{}", current, target_version);

        let pending = get_migrations()
            .into_iter()
            .filter(|m| m.version > current && m.version <= target_version);
        for migration in pending {
            self.run_migration(migration.version)?;
            self.set_schema_version(migration.version)?;
            tracing::info!("Applied schema v{}: {}", migration.version, migration.description);
        }

        self.get_schema_version()
    }

    /// Run a specific migration
    fn run_migration(&self, version: u32) -> StorageResult<()>;

    /// Migrate to the latest version
    fn migrate_to_latest(&self) -> StorageResult<u32> {
        self.migrate_to(CURRENT_VERSION)
    }
}
