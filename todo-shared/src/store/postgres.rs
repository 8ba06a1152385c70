/// PostgreSQL store
///
/// Thin adapter from the store traits onto the model functions in
/// `crate::models`. The only translation it does is mapping the
/// `users_email_key` unique violation onto `StoreError::DuplicateEmail`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, TodoStore, TokenStore, UserStore};
use crate::db::pool::health_check;
use crate::models::access_token::{AccessToken, CreateAccessToken};
use crate::models::todo::{NewTodo, Pagination, Todo, UpdateTodo};
use crate::models::user::{normalize_email, CreateUser, User};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_user_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, mut data: CreateUser) -> Result<User, StoreError> {
        data.email = normalize_email(&data.email);
        User::create(&self.pool, data)
            .await
            .map_err(map_user_insert_error)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, &normalize_email(email)).await?)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_token(&self, data: CreateAccessToken) -> Result<AccessToken, StoreError> {
        Ok(AccessToken::create(&self.pool, data).await?)
    }

    async fn touch_token(&self, token_hash: &str) -> Result<Option<AccessToken>, StoreError> {
        Ok(AccessToken::touch_by_hash(&self.pool, token_hash).await?)
    }

    async fn delete_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(AccessToken::delete_by_hash(&self.pool, token_hash).await?)
    }

    async fn list_tokens(&self, user_id: Uuid) -> Result<Vec<AccessToken>, StoreError> {
        Ok(AccessToken::list_by_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn list_by_owner(
        &self,
        owner: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Todo>, StoreError> {
        Ok(Todo::list_by_owner(&self.pool, owner, pagination).await?)
    }

    async fn count_by_owner(&self, owner: Uuid) -> Result<i64, StoreError> {
        Ok(Todo::count_by_owner(&self.pool, owner).await?)
    }

    async fn find_todo(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        Ok(Todo::find_by_id(&self.pool, id).await?)
    }

    async fn create_todo(&self, owner: Uuid, data: NewTodo) -> Result<Todo, StoreError> {
        Ok(Todo::create(&self.pool, owner, data).await?)
    }

    async fn update_todo(&self, id: Uuid, data: UpdateTodo) -> Result<Option<Todo>, StoreError> {
        Ok(Todo::update(&self.pool, id, data).await?)
    }

    async fn delete_todo(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Todo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
