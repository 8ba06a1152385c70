/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`; library errors convert into
/// [`ApiError`] with `?` and render as
///
/// ```json
/// { "error": "validation_error", "message": "...", "errors": { "email": ["..."] } }
/// ```
///
/// `errors` is only present on 422 responses.
///
/// # Example
///
/// ```
/// use todo_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(id: &str) -> ApiResult<Json<Value>> {
///     let id: uuid::Uuid = id.parse().map_err(|_| ApiError::NotFound("Todo not found".into()))?;
///     Ok(Json(json!({ "id": id })))
/// }
/// ```

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use todo_shared::auth::{
    authorization::AuthzError, credentials::CredentialError, middleware::AuthError,
    password::PasswordError,
};
use todo_shared::models::todo::TodoError;
use todo_shared::store::StoreError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Field name to messages, in field order
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Generic message for failed logins
pub const INVALID_CREDENTIALS: &str = "These credentials do not match our records.";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. a body that is not JSON
    BadRequest(String),

    /// Missing, malformed, unknown or revoked bearer token (401)
    Unauthenticated,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422) with per-field messages
    Validation(FieldErrors),

    /// Internal server error (500); the message is logged, never returned
    Internal(String),
}

impl ApiError {
    /// 422 with a single field message
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g. "unauthenticated", "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} fields", errors.len())
            }
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, errors) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthenticated => ("unauthenticated", "Unauthenticated.".to_string(), None),
            ApiError::Forbidden => ("forbidden", "This action is unauthorized.".to_string(), None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Validation(errors) => {
                // First message doubles as the summary
                let message = errors
                    .values()
                    .flatten()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| "The given data was invalid.".to_string());
                ("validation_error", message, Some(errors))
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ("internal_error", "An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

/// Convert validator errors to a 422
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();

        for (field, field_errors) in err.field_errors() {
            let messages = field_errors.iter().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field))
            });
            errors.entry(field.to_string()).or_default().extend(messages);
        }

        ApiError::Validation(errors)
    }
}

/// Prefix axum puts on `JsonDataError` bodies
const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Field errors for well-formed JSON of the wrong shape
///
/// The rejection text reads `<prefix><path>: <serde message>`; the path is
/// absent when the body itself has the wrong type, which is reported under
/// `body`.
fn json_data_errors(text: &str) -> FieldErrors {
    let detail = text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(text);

    let (field, reason) = match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (path, reason)
        }
        _ => ("body", detail),
    };

    let attribute = field.replace('_', " ");
    let message = if reason.contains("expected a string") {
        format!("The {} field must be a string.", attribute)
    } else if reason.contains("expected a boolean") {
        format!("The {} field must be true or false.", attribute)
    } else {
        format!("The {} field is invalid.", attribute)
    };

    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![message]);
    errors
}

/// Convert JSON body rejections
///
/// A body that parses but has a wrong-typed field is a 422 on that field.
/// Anything else (bad syntax, missing content type) is a 400.
impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        match err {
            JsonRejection::JsonDataError(e) => ApiError::Validation(json_data_errors(&e.body_text())),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::field("email", "The email has already been taken."),
            StoreError::Database(e) => ApiError::Internal(format!("Database error: {}", e)),
        }
    }
}

/// Convert bearer authentication errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::InvalidFormat | AuthError::InvalidToken => {
                ApiError::Unauthenticated
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => ApiError::Unauthenticated,
            AuthzError::Forbidden => ApiError::Forbidden,
        }
    }
}

/// Convert credential errors to API errors
impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::DuplicateIdentity => {
                ApiError::field("email", "The email has already been taken.")
            }
            CredentialError::InvalidCredentials => ApiError::field("email", INVALID_CREDENTIALS),
            CredentialError::Password(e) => e.into(),
            CredentialError::Store(e) => e.into(),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert todo input errors to a 422 on the offending field
impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        ApiError::field(err.field(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Todo not found".to_string());
        assert_eq!(err.to_string(), "Not found: Todo not found");
    }

    #[tokio::test]
    async fn test_validation_body() {
        let (status, body) = body_json(ApiError::field("title", "The title field is required.")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "The title field is required.");
        assert_eq!(body["errors"]["title"][0], "The title field is required.");
    }

    #[tokio::test]
    async fn test_non_validation_body_has_no_errors() {
        let (status, body) = body_json(ApiError::Unauthenticated).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthenticated.");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = body_json(ApiError::Internal("connection refused".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_credential_errors_map_to_email_field() {
        match ApiError::from(CredentialError::InvalidCredentials) {
            ApiError::Validation(errors) => {
                assert_eq!(errors["email"], vec![INVALID_CREDENTIALS.to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            ApiError::from(CredentialError::DuplicateIdentity).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_auth_errors_are_401() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::InvalidFormat,
            AuthError::InvalidToken,
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_authz_errors() {
        assert_eq!(ApiError::from(AuthzError::Forbidden).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(AuthzError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_json_data_errors_keyed_on_field() {
        let errors = json_data_errors(
            "Failed to deserialize the JSON body into the target type: title: invalid type: integer `123`, expected a string at line 1 column 12",
        );
        assert_eq!(errors["title"], vec!["The title field must be a string.".to_string()]);

        let errors = json_data_errors(
            "Failed to deserialize the JSON body into the target type: is_completed: invalid type: string \"yes\", expected a boolean at line 1 column 22",
        );
        assert_eq!(
            errors["is_completed"],
            vec!["The is completed field must be true or false.".to_string()]
        );
    }

    #[test]
    fn test_json_data_errors_without_path() {
        let errors = json_data_errors(
            "Failed to deserialize the JSON body into the target type: invalid type: sequence, expected struct CreateTodoRequest at line 1 column 1",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["body"], vec!["The body field is invalid.".to_string()]);
    }

    #[test]
    fn test_todo_error_maps_to_title() {
        match ApiError::from(TodoError::EmptyTitle) {
            ApiError::Validation(errors) => {
                assert_eq!(errors["title"], vec!["The title field is required.".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
