//! # Todo Shared Library
//!
//! Domain types, persistence and authentication for the todo API.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL
//! - `store`: Owner-scoped repository traits with PostgreSQL and in-memory
//!   implementations
//! - `auth`: Passwords, bearer tokens, identity and access decisions
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the todo shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
