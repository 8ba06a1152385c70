/// Token lifecycle: issue, validate, revoke
///
/// Ties the token primitives in `auth::token` to a [`TokenStore`]. The raw
/// token exists only in the return value of [`issue`] and in the client's
/// hands; every store call sees the SHA-256 hash.
///
/// # Example
///
/// ```
/// use todo_shared::auth::issuer::{issue, revoke, validate};
/// use todo_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user_id = Uuid::new_v4();
///
/// let token = issue(&store, user_id, Some("iphone")).await?;
/// let auth = validate(&store, &token).await?.expect("token is live");
/// assert_eq!(auth.user_id, user_id);
///
/// assert!(revoke(&store, &token).await?);
/// assert!(validate(&store, &token).await?.is_none());
/// # Ok(())
/// # }
/// ```

use tracing::{debug, info};
use uuid::Uuid;

use super::middleware::AuthContext;
use super::token::{generate_token, hash_token, validate_token_format};
use crate::models::access_token::{CreateAccessToken, DEFAULT_TOKEN_NAME};
use crate::store::{StoreError, TokenStore};

/// Mints a token for `user_id` and stores its hash
///
/// A missing or blank device label becomes `api_token`. Returns the raw
/// token; it cannot be recovered later.
pub async fn issue<S>(store: &S, user_id: Uuid, device_name: Option<&str>) -> Result<String, StoreError>
where
    S: TokenStore + ?Sized,
{
    let name = device_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_TOKEN_NAME);

    let (token, token_hash) = generate_token();
    let stored = store
        .insert_token(CreateAccessToken {
            user_id,
            name: name.to_string(),
            token_hash,
        })
        .await?;

    info!(user_id = %user_id, token_id = %stored.id, device = %stored.name, "Issued access token");
    Ok(token)
}

/// Resolves a raw token to the identity it belongs to
///
/// `Ok(None)` means the token is malformed, unknown, revoked or expired.
/// Only store failures are errors.
pub async fn validate<S>(store: &S, token: &str) -> Result<Option<AuthContext>, StoreError>
where
    S: TokenStore + ?Sized,
{
    if !validate_token_format(token) {
        debug!("Rejected malformed access token");
        return Ok(None);
    }

    match store.touch_token(&hash_token(token)).await? {
        Some(stored) => Ok(Some(AuthContext {
            user_id: stored.user_id,
            token_id: stored.id,
        })),
        None => {
            debug!("Access token not found");
            Ok(None)
        }
    }
}

/// Deletes exactly the stored token matching `token`
///
/// Returns false if nothing matched. Other tokens of the same user are left
/// alone.
pub async fn revoke<S>(store: &S, token: &str) -> Result<bool, StoreError>
where
    S: TokenStore + ?Sized,
{
    let removed = store.delete_token(&hash_token(token)).await?;
    if removed {
        info!("Revoked access token");
    }
    Ok(removed)
}
