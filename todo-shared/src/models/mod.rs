/// Database models for the todo service
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `access_token`: Hashed personal access tokens, one per device
/// - `todo`: Owner-scoped todo items and pagination
///
/// Handlers never call these directly; they go through `crate::store`, which
/// wraps them for Postgres and mirrors them in memory for tests.

pub mod access_token;
pub mod todo;
pub mod user;
