//! Amity Core - Relationship model for the social graph
//!
//! This crate provides the data types, email handling and the pure
//! set algorithms used by the relationship and query engines.

pub mod commons;
pub mod edge;
pub mod email;
pub mod error;
pub mod recipients;
pub mod user;
pub mod validation;

pub use commons::intersect;
pub use edge::{Edge, EdgeKind};
pub use email::{extract_mentions, is_valid_email, normalize_email};
pub use error::{Error, ErrorKind, Result};
pub use recipients::RecipientSet;
pub use user::{User, UserId};
