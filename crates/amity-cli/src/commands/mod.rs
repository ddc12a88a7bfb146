//! CLI command implementations

pub mod admin;
pub mod completions;
pub mod config;
pub mod friend;
pub mod notify;
