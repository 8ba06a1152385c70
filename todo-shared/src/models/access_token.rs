/// Personal access token model and database operations
///
/// A personal access token is the bearer credential a client presents on every
/// authenticated request. One user may hold many tokens, one per device.
///
/// # Security
///
/// - Only the SHA-256 hash of the token is stored (never plaintext)
/// - The raw token is returned once, when it is issued
/// - Tokens do not expire on their own; `expires_at` stays NULL unless set
/// - Logout deletes exactly one row
///
/// # Schema
///
/// ```sql
/// CREATE TABLE personal_access_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_used_at TIMESTAMPTZ,
///     expires_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Device label used when the client does not send one
pub const DEFAULT_TOKEN_NAME: &str = "api_token";

/// Stored access token record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessToken {
    /// Unique token ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Device label (e.g. "iphone", "postman")
    pub name: String,

    /// SHA-256 hex digest of the raw token
    #[serde(skip_serializing, default)]
    pub token_hash: String,

    /// When the token was issued
    pub created_at: DateTime<Utc>,

    /// When the token last authenticated a request
    pub last_used_at: Option<DateTime<Utc>>,

    /// Optional expiry; NULL means valid until revoked
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input for storing a freshly issued token
#[derive(Debug, Clone)]
pub struct CreateAccessToken {
    /// Owning user
    pub user_id: Uuid,

    /// Device label
    pub name: String,

    /// SHA-256 hex digest of the raw token
    pub token_hash: String,
}

impl AccessToken {
    /// Checks if the token is expired
    ///
    /// Returns true only if `expires_at` is set and in the past.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now(),
            None => false,
        }
    }

    /// Stores a token hash
    pub async fn create(pool: &PgPool, data: CreateAccessToken) -> Result<Self, sqlx::Error> {
        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            INSERT INTO personal_access_tokens (user_id, name, token_hash)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, token_hash, created_at, last_used_at, expires_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.token_hash)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Looks up a live token by hash and stamps `last_used_at`
    ///
    /// Returns `None` for unknown or expired hashes. The lookup and the
    /// timestamp refresh are a single statement.
    pub async fn touch_by_hash(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            UPDATE personal_access_tokens
            SET last_used_at = NOW()
            WHERE token_hash = $1
              AND (expires_at IS NULL OR expires_at > NOW())
            RETURNING id, user_id, name, token_hash, created_at, last_used_at, expires_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Deletes the token with the given hash
    ///
    /// Returns true if a row was removed.
    pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's tokens, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tokens = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, user_id, name, token_hash, created_at, last_used_at, expires_at
            FROM personal_access_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tokens)
    }
}
