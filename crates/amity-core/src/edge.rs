//! Edge types for the three relationship tables

use crate::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of relationship an edge records
///
/// Friendship is symmetric and always stored as two directed rows.
/// Blocks and subscriptions are directed: `from` blocks `to`, or
/// `from` wants to be notified about `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Friend,
    Block,
    Subscription,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Block => "block",
            Self::Subscription => "subscription",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single directed edge row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,

    /// Source user
    pub from: UserId,

    /// Target user
    pub to: UserId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(kind: EdgeKind, from: UserId, to: UserId) -> Self {
        Self {
            kind,
            from,
            to,
            created_at: Utc::now(),
        }
    }

    /// The same edge pointing the other way
    pub fn reversed(&self) -> Self {
        Self {
            kind: self.kind,
            from: self.to.clone(),
            to: self.from.clone(),
            created_at: self.created_at,
        }
    }
}
