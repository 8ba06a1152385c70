/// Todo model and database operations
///
/// A todo belongs to exactly one user. The owner is taken from the
/// authenticated identity at creation and no update path can change it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todos (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL CHECK (length(title) > 0),
///     description TEXT,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     due_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use todo_shared::models::todo::{NewTodo, Pagination, Todo};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let todo = Todo::create(&pool, owner, NewTodo::new("Write documentation", None, None)?).await?;
///
/// let page = Todo::list_by_owner(&pool, owner, Pagination::new(Some(15), Some(1))).await?;
/// assert_eq!(page[0].id, todo.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Smallest page size a caller can get
pub const MIN_PER_PAGE: i64 = 1;

/// Largest page size a caller can get
pub const MAX_PER_PAGE: i64 = 100;

/// Page size when the caller does not ask for one
pub const DEFAULT_PER_PAGE: i64 = 15;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Error type for todo input checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TodoError {
    /// Title is empty or whitespace
    #[error("The title field is required.")]
    EmptyTitle,

    /// Title is longer than `MAX_TITLE_LENGTH`
    #[error("The title field must not be greater than 255 characters.")]
    TitleTooLong,
}

impl TodoError {
    /// Name of the input field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            TodoError::EmptyTitle | TodoError::TitleTooLong => "title",
        }
    }
}

/// Todo record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    /// Unique todo ID
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub user_id: Uuid,

    /// Title (never empty)
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Completion flag
    pub is_completed: bool,

    /// Optional due date
    pub due_at: Option<DateTime<Utc>>,

    /// When the todo was created
    pub created_at: DateTime<Utc>,

    /// When the todo was last updated
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a todo
///
/// Can only be built through [`NewTodo::new`], so an empty title never reaches
/// a store. There is deliberately no owner field: the owner is passed
/// separately from the authenticated identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    title: String,
    description: Option<String>,
    due_at: Option<DateTime<Utc>>,
}

impl NewTodo {
    /// Validates and builds creation input
    ///
    /// # Errors
    ///
    /// - `TodoError::EmptyTitle` if the title is empty after trimming
    /// - `TodoError::TitleTooLong` if it exceeds 255 characters
    ///
    /// A blank description is stored as no description.
    ///
    /// # Example
    ///
    /// ```
    /// use todo_shared::models::todo::{NewTodo, TodoError};
    ///
    /// assert!(NewTodo::new("Buy milk", None, None).is_ok());
    /// assert_eq!(NewTodo::new("   ", None, None), Err(TodoError::EmptyTitle));
    /// ```
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        due_at: Option<DateTime<Utc>>,
    ) -> Result<Self, TodoError> {
        let title = validate_title(title.into())?;

        Ok(Self {
            title,
            description: normalize_description(description),
            due_at,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }
}

/// Partial update for a todo
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` clears
/// the value. There is no owner field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTodo {
    /// New title
    pub title: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New completion flag
    pub is_completed: Option<bool>,

    /// New due date (use Some(None) to clear)
    pub due_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateTodo {
    /// Validates the fields that are present
    ///
    /// Returns the update with its title trimmed and a blank description
    /// turned into a clear.
    pub fn validated(mut self) -> Result<Self, TodoError> {
        if let Some(title) = self.title.take() {
            self.title = Some(validate_title(title)?);
        }
        self.description = self.description.map(normalize_description);
        Ok(self)
    }

    /// True if no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_completed.is_none()
            && self.due_at.is_none()
    }

    /// Applies the update to an in-memory record
    pub fn apply_to(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(is_completed) = self.is_completed {
            todo.is_completed = is_completed;
        }
        if let Some(due_at) = self.due_at {
            todo.due_at = due_at;
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

fn validate_title(title: String) -> Result<String, TodoError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TodoError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TodoError::TitleTooLong);
    }
    Ok(title.to_string())
}

/// Clamped pagination window for listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    per_page: i64,
    page: i64,
}

impl Pagination {
    /// Builds a window, clamping out-of-range values instead of rejecting them
    ///
    /// `per_page` is clamped to `1..=100` (default 15) and `page` to `>= 1`
    /// (default 1).
    ///
    /// # Example
    ///
    /// ```
    /// use todo_shared::models::todo::Pagination;
    ///
    /// assert_eq!(Pagination::new(Some(500), None).per_page(), 100);
    /// assert_eq!(Pagination::new(Some(0), None).per_page(), 1);
    /// assert_eq!(Pagination::new(None, Some(-3)).page(), 1);
    /// ```
    pub fn new(per_page: Option<i64>, page: Option<i64>) -> Self {
        Self {
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(MIN_PER_PAGE, MAX_PER_PAGE),
            page: page.unwrap_or(1).max(1),
        }
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Number of the last page for `total` rows (at least 1)
    pub fn last_page(&self, total: i64) -> i64 {
        ((total + self.per_page - 1) / self.per_page).max(1)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl Todo {
    /// Creates a todo owned by `owner`
    pub async fn create(pool: &PgPool, owner: Uuid, data: NewTodo) -> Result<Self, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (user_id, title, description, due_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, is_completed, due_at,
                      created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_at)
        .fetch_one(pool)
        .await?;

        Ok(todo)
    }

    /// Finds a todo by ID, regardless of owner
    ///
    /// Ownership is decided by the caller (see `auth::authorization`).
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, description, is_completed, due_at,
                   created_at, updated_at
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Lists one owner's todos, newest first
    pub async fn list_by_owner(
        pool: &PgPool,
        owner: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let todos = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, description, is_completed, due_at,
                   created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(pagination.per_page())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

        Ok(todos)
    }

    /// Counts one owner's todos
    pub async fn count_by_owner(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos WHERE user_id = $1")
            .bind(owner)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Applies a partial update
    ///
    /// Only present fields are written; `updated_at` is always refreshed.
    /// Returns `None` if the todo does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTodo,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE todos SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.is_completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_completed = ${}", bind_count));
        }
        if data.due_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_at = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, user_id, title, description, is_completed, due_at, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(is_completed) = data.is_completed {
            q = q.bind(is_completed);
        }
        if let Some(due_at) = data.due_at {
            q = q.bind(due_at);
        }

        let todo = q.fetch_optional(pool).await?;

        Ok(todo)
    }

    /// Deletes a todo
    ///
    /// Returns false if it was already gone.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
