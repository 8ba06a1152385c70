/// PostgreSQL plumbing
///
/// - `pool`: connection pool construction, health check and shutdown
/// - `migrations`: embedded schema migrations for `users`,
///   `personal_access_tokens` and `todos`
///
/// Models live in `crate::models`; the trait-based facade over them lives in
/// `crate::store`.

pub mod migrations;
pub mod pool;
