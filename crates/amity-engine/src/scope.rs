//! Transaction completion helpers
//!
//! Each engine operation does its work in an inner function and then hands
//! the outcome here, so commit/rollback happens on exactly one path.

use amity_core::Result;
use amity_storage::StoreTransaction;

/// Commit on success, roll back on failure
pub(crate) async fn complete<T>(
    tx: &mut (dyn StoreTransaction + '_),
    outcome: Result<T>,
) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            abandon(tx, &err).await;
            Err(err)
        }
    }
}

/// Roll back regardless of outcome; used for reads that wrote nothing
pub(crate) async fn release<T>(
    tx: &mut (dyn StoreTransaction + '_),
    outcome: Result<T>,
) -> Result<T> {
    match outcome {
        Ok(value) => {
            if let Err(e) = tx.rollback().await {
                tracing::warn!("Failed to release read transaction: {}", e);
            }
            Ok(value)
        }
        Err(err) => {
            abandon(tx, &err).await;
            Err(err)
        }
    }
}

async fn abandon(tx: &mut (dyn StoreTransaction + '_), cause: &amity_core::Error) {
    tracing::debug!("Rolling back transaction: {}", cause);
    if let Err(e) = tx.rollback().await {
        tracing::warn!("Rollback failed after '{}': {}", cause, e);
    }
}
