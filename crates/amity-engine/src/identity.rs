//! Identity resolution: email to user record

use amity_core::{normalize_email, Error, Result, User};
use amity_storage::StoreTransaction;

/// Outcome of [`IdentityResolver::resolve`]
#[derive(Debug, Clone)]
pub struct Resolved {
    pub user: User,

    /// True when the user row was written by this call
    pub created: bool,
}

/// Maps emails to user records inside the caller's transaction
pub struct IdentityResolver;

impl IdentityResolver {
    /// Find the user for an email, creating it if absent
    ///
    /// A second call for the same email in the same transaction sees the
    /// first call's row instead of creating another.
    pub async fn resolve(tx: &mut (dyn StoreTransaction + '_), email: &str) -> Result<Resolved> {
        let email = normalize_email(email);

        if let Some(user) = tx.find_user(&email).await? {
            return Ok(Resolved {
                user,
                created: false,
            });
        }

        let user = User::new(&email);
        tx.insert_user(&user).await.map_err(|e| {
            tracing::error!("Failed to create user {}: {}", email, e);
            Error::from(e)
        })?;
        tracing::debug!("Created user {} ({})", user.email, user.id);

        Ok(Resolved {
            user,
            created: true,
        })
    }

    /// Exact lookup without creation
    pub async fn lookup(tx: &mut (dyn StoreTransaction + '_), email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(tx.find_user(&email).await?)
    }

    /// Exact lookup that fails with `NotFound` for unknown emails
    pub async fn require(tx: &mut (dyn StoreTransaction + '_), email: &str) -> Result<User> {
        match Self::lookup(tx, email).await? {
            Some(user) => Ok(user),
            None => Err(Error::user_not_found(&normalize_email(email))),
        }
    }
}
