/// Bearer authentication for Axum
///
/// Pulls `Authorization: Bearer <token>` out of a request and resolves it to
/// an [`AuthContext`] through `auth::issuer::validate`. The API's middleware
/// layer calls [`authenticate_headers`] and inserts the context into request
/// extensions, where handlers read it with `Extension<AuthContext>`.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use todo_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::issuer;
use crate::store::{StoreError, TokenStore};

/// Identity resolved from a valid token, for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: Uuid,

    /// The stored token the request presented
    pub token_id: Uuid,
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Unknown, revoked or malformed token
    #[error("Invalid or revoked token")]
    InvalidToken,

    /// Token store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Extracts the raw bearer token from request headers
///
/// The scheme is matched case-insensitively; surrounding whitespace is
/// ignored.
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use todo_shared::auth::middleware::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer todo_abc"));
/// assert_eq!(bearer_token(&headers).unwrap(), "todo_abc");
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?
        .trim();

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Resolves request headers to an identity
pub async fn authenticate_headers<S>(store: &S, headers: &HeaderMap) -> Result<AuthContext, AuthError>
where
    S: TokenStore + ?Sized,
{
    let token = bearer_token(headers)?;

    issuer::validate(store, token)
        .await?
        .ok_or(AuthError::InvalidToken)
}
