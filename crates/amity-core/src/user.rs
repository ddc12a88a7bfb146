//! User (identity) types

use crate::email::normalize_email;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Stable identifier for a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Ulid);

impl UserId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn from_string(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user identity, keyed by its normalized email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier
    pub id: UserId,

    /// Normalized (trimmed, lowercase) email, unique across users
    pub email: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user; the email is normalized on the way in
    pub fn new(email: &str) -> Self {
        Self {
            id: UserId::new(),
            email: normalize_email(email),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation_normalizes_email() {
        let user = User::new("  Andy@Example.COM ");
        assert_eq!(user.email, "andy@example.com");
    }

    #[test]
    fn test_user_ids_are_unique() {
        let a = User::new("a@x.com");
        let b = User::new("a@x.com");
        assert_ne!(a.id, b.id);

        let parsed = UserId::from_string(&a.id.to_string()).unwrap();
        assert_eq!(parsed, a.id);
    }
}
