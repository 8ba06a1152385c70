/// Todo endpoints
///
/// All routes require a bearer token and act only on the caller's own todos.
///
/// # Endpoints
///
/// - `GET /todos?per_page=15&page=1` - List own todos, newest first
/// - `POST /todos` - Create a todo
/// - `GET /todos/:id` - Show one todo
/// - `PATCH|PUT /todos/:id` - Partially update a todo
/// - `DELETE /todos/:id` - Delete a todo
///
/// # Lookup Order
///
/// The todo is loaded first and authorized second: an id that does not exist
/// (or does not parse) is a 404, an id owned by someone else is a 403.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{collect_errors, ensure_valid},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use todo_shared::{
    auth::{
        authorization::{authorize, Action, Resource},
        middleware::AuthContext,
    },
    models::todo::{NewTodo, Pagination, Todo, UpdateTodo},
};
use uuid::Uuid;
use validator::Validate;

/// Query string for listing
///
/// Values are read leniently: anything that is not an integer falls back to
/// the default, and integers are clamped.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub per_page: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    fn pagination(&self) -> Pagination {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Pagination::new(parse(&self.per_page), parse(&self.page))
    }
}

/// Create request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateTodoRequest {
    /// Title (required)
    #[validate(length(max = 255, message = "The title field must not be greater than 255 characters."))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional due date, RFC 3339
    pub due_at: Option<String>,
}

/// Partial update request
///
/// Absent fields are left alone; `null` clears `description` and `due_at`.
/// A `null` title is rejected. An `user_id` in the body is ignored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateTodoRequest {
    #[serde(deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub is_completed: Option<bool>,

    #[serde(deserialize_with = "double_option")]
    pub due_at: Option<Option<String>>,
}

/// Distinguishes a present `null` (`Some(None)`) from an absent field (`None`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Todo as returned to clients
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            is_completed: todo.is_completed,
            due_at: todo.due_at,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

/// Single todo envelope
#[derive(Debug, Serialize)]
pub struct TodoEnvelope {
    pub data: TodoResponse,
}

impl From<Todo> for TodoEnvelope {
    fn from(todo: Todo) -> Self {
        Self { data: todo.into() }
    }
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

/// One page of todos
#[derive(Debug, Serialize)]
pub struct TodoPage {
    pub data: Vec<TodoResponse>,
    pub meta: PageMeta,
}

/// Local date-time layouts accepted besides RFC 3339, read as UTC
const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a due date
///
/// Accepts RFC 3339, an offset-less date-time such as `2025-01-02T09:00`
/// (what a `datetime-local` input sends) or a bare date at midnight. Values
/// without an offset are taken as UTC.
fn parse_due_at(value: &str) -> ApiResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::field("due_at", "The due at field must be a valid date."))
}

fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound("Todo not found.".to_string()))
}

/// Loads a todo by path id, 404 if missing or unparsable
async fn load_todo(state: &AppState, id: &str) -> ApiResult<Todo> {
    let id = parse_id(id)?;

    state
        .store
        .find_todo(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Todo not found.".to_string()))
}

/// List the caller's todos
///
/// # Response
///
/// ```json
/// {
///   "data": [{ "id": "uuid", "title": "...", "is_completed": false, ... }],
///   "meta": { "current_page": 1, "per_page": 15, "total": 1, "last_page": 1 }
/// }
/// ```
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TodoPage>> {
    authorize(Some(&auth), Action::View, Resource::Todos)?;

    let pagination = params.pagination();
    let todos = state.store.list_by_owner(auth.user_id, pagination).await?;
    let total = state.store.count_by_owner(auth.user_id).await?;

    Ok(Json(TodoPage {
        data: todos.into_iter().map(TodoResponse::from).collect(),
        meta: PageMeta {
            current_page: pagination.page(),
            per_page: pagination.per_page(),
            total,
            last_page: pagination.last_page(total),
        },
    }))
}

/// Create a todo owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /todos
/// { "title": "Write documentation", "description": "...", "due_at": "2025-01-02T09:00:00Z" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: missing/empty title, title too long, bad date
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TodoEnvelope>)> {
    authorize(Some(&auth), Action::Create, Resource::Todos)?;

    let Json(req) = payload?;
    ensure_valid(collect_errors(&req, &[("title", req.title.as_str())]))?;

    let due_at = req.due_at.as_deref().map(parse_due_at).transpose()?;
    let new_todo = NewTodo::new(req.title, req.description, due_at)?;

    let todo = state.store.create_todo(auth.user_id, new_todo).await?;
    tracing::info!(user_id = %auth.user_id, todo_id = %todo.id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo.into())))
}

/// Show one of the caller's todos
pub async fn show_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TodoEnvelope>> {
    let todo = load_todo(&state, &id).await?;
    authorize(Some(&auth), Action::View, Resource::Todo(&todo))?;

    Ok(Json(todo.into()))
}

/// Partially update one of the caller's todos
///
/// Only the fields present in the body change. Serves both PATCH and PUT.
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> ApiResult<Json<TodoEnvelope>> {
    let todo = load_todo(&state, &id).await?;
    authorize(Some(&auth), Action::Update, Resource::Todo(&todo))?;

    let Json(req) = payload?;
    ensure_valid(collect_errors(&req, &[]))?;

    let title = match req.title {
        Some(Some(title)) => Some(title),
        Some(None) => return Err(ApiError::field("title", "The title field is required.")),
        None => None,
    };
    let due_at = match req.due_at {
        Some(Some(value)) => Some(Some(parse_due_at(&value)?)),
        Some(None) => Some(None),
        None => None,
    };
    let update = UpdateTodo {
        title,
        description: req.description,
        is_completed: req.is_completed,
        due_at,
    }
    .validated()?;

    if update.is_empty() {
        return Ok(Json(todo.into()));
    }

    let updated = state
        .store
        .update_todo(todo.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Todo not found.".to_string()))?;
    tracing::info!(user_id = %auth.user_id, todo_id = %updated.id, "Todo updated");

    Ok(Json(updated.into()))
}

/// Delete one of the caller's todos
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let todo = load_todo(&state, &id).await?;
    authorize(Some(&auth), Action::Delete, Resource::Todo(&todo))?;

    state.store.delete_todo(todo.id).await?;
    tracing::info!(user_id = %auth.user_id, todo_id = %todo.id, "Todo deleted");

    Ok(StatusCode::NO_CONTENT)
}
