//! # Taskboard Shared Library
//!
//! Types and business logic shared by the Taskboard API server and worker.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, bearer tokens, request middleware, role policy
//! - `error`: the service error taxonomy
//! - `models`: database models and their SQL
//! - `db`: connection pools and migrations
//! - `store`: storage ports with Postgres and in-memory adapters
//! - `services`: identity, membership, invitations, boards, tasks, cascade
//! - `events`: the `BoardDeleted` event and its transport traits
//! - `redis`: Redis Streams transport

pub mod auth;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod redis;
pub mod services;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
