/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`token`]: opaque bearer token generation and hashing
/// - [`issuer`]: token issue / validate / revoke against a store
/// - [`credentials`]: registration and login
/// - [`authorization`]: the per-resource access decision
/// - [`middleware`]: bearer header parsing and the request identity
///
/// # Example
///
/// ```
/// use todo_shared::auth::{credentials, issuer};
/// use todo_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let user = credentials::register(&store, "Jane", "jane@example.com", "password123").await?;
/// let token = issuer::issue(&store, user.id, Some("laptop")).await?;
///
/// let auth = issuer::validate(&store, &token).await?.expect("fresh token");
/// assert_eq!(auth.user_id, user.id);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod credentials;
pub mod issuer;
pub mod middleware;
pub mod password;
pub mod token;
