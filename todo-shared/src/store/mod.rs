/// Persistence interfaces
///
/// Every repository takes the owner explicitly; nothing here knows about the
/// current request. Two implementations ship with the crate:
///
/// - [`PgStore`]: PostgreSQL via `sqlx`, delegating to `crate::models`
/// - [`MemoryStore`]: in-process maps behind a `tokio::sync::RwLock`
///
/// # Example
///
/// ```
/// use todo_shared::models::todo::{NewTodo, Pagination};
/// use todo_shared::store::{MemoryStore, TodoStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let owner = Uuid::new_v4();
///
/// store.create_todo(owner, NewTodo::new("Buy milk", None, None)?).await?;
/// let todos = store.list_by_owner(owner, Pagination::default()).await?;
/// assert_eq!(todos.len(), 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::access_token::{AccessToken, CreateAccessToken};
use crate::models::todo::{NewTodo, Pagination, Todo, UpdateTodo};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user with this email already exists
    #[error("email is already registered")]
    DuplicateEmail,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user
    ///
    /// Returns `StoreError::DuplicateEmail` if the (normalized) email is taken.
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Access token persistence, keyed by hash
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(&self, data: CreateAccessToken) -> Result<AccessToken, StoreError>;

    /// Finds a live token by hash and refreshes `last_used_at`
    async fn touch_token(&self, token_hash: &str) -> Result<Option<AccessToken>, StoreError>;

    /// Deletes the token with this hash; true if one was removed
    async fn delete_token(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// All tokens of one user, newest first
    async fn list_tokens(&self, user_id: Uuid) -> Result<Vec<AccessToken>, StoreError>;
}

/// Todo persistence
///
/// Lookups by id do not check ownership; callers authorize first.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// One page of the owner's todos, newest first
    async fn list_by_owner(&self, owner: Uuid, pagination: Pagination)
        -> Result<Vec<Todo>, StoreError>;

    async fn count_by_owner(&self, owner: Uuid) -> Result<i64, StoreError>;

    async fn find_todo(&self, id: Uuid) -> Result<Option<Todo>, StoreError>;

    async fn create_todo(&self, owner: Uuid, data: NewTodo) -> Result<Todo, StoreError>;

    /// Applies a partial update; `None` if the todo is gone
    async fn update_todo(&self, id: Uuid, data: UpdateTodo) -> Result<Option<Todo>, StoreError>;

    /// Removes a todo; false if it was already gone
    async fn delete_todo(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Everything the API needs from persistence
#[async_trait]
pub trait Store: UserStore + TokenStore + TodoStore {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    /// Checks the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
