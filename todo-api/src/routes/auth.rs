/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create an account and get a token
/// - `POST /auth/login` - Exchange credentials for a token
/// - `POST /auth/logout` - Revoke the token used for this request
///
/// Every successful register/login mints a new token; a user can hold one per
/// device. Logout deletes only the presented token.

use crate::{
    app::AppState,
    error::{ApiResult, FieldErrors},
    routes::{collect_errors, ensure_valid},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use todo_shared::{
    auth::{
        credentials, issuer,
        middleware::{bearer_token, AuthContext},
        password::validate_password_length,
    },
    models::user::User,
};
use validator::Validate;

/// Register request
///
/// Missing fields deserialize to empty values so they are reported as
/// field errors rather than a body rejection.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(max = 255, message = "The name field must not be greater than 255 characters."))]
    pub name: String,

    /// Email address
    #[validate(
        email(message = "The email field must be a valid email address."),
        length(max = 255, message = "The email field must not be greater than 255 characters.")
    )]
    pub email: String,

    /// Password (at least 8 characters)
    pub password: String,

    /// Must equal `password`
    pub password_confirmation: String,

    /// Optional device label for the token
    #[validate(length(max = 255, message = "The device name field must not be greater than 255 characters."))]
    pub device_name: Option<String>,
}

/// Login request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: String,

    /// Password
    pub password: String,

    /// Optional device label for the token
    #[validate(length(max = 255, message = "The device name field must not be greater than 255 characters."))]
    pub device_name: Option<String>,
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Raw bearer token; shown once
    pub token: String,

    /// The authenticated user
    pub user: User,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn register_errors(req: &RegisterRequest) -> FieldErrors {
    let mut errors = collect_errors(
        req,
        &[
            ("name", req.name.as_str()),
            ("email", req.email.as_str()),
            ("password", req.password.as_str()),
        ],
    );

    if !errors.contains_key("password") {
        if let Err(message) = validate_password_length(&req.password) {
            errors.insert("password".to_string(), vec![message]);
        } else if req.password != req.password_confirmation {
            errors.insert(
                "password".to_string(),
                vec!["The password field confirmation does not match.".to_string()],
            );
        }
    }

    errors
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Jane Doe",
///   "email": "jane@example.com",
///   "password": "password123",
///   "password_confirmation": "password123",
///   "device_name": "iphone"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "token": "todo_...", "user": { "id": "uuid", "name": "Jane Doe", "email": "jane@example.com", ... } }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed or email already taken
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    ensure_valid(register_errors(&req))?;

    let store = state.store.as_ref();
    let user = credentials::register(store, &req.name, &req.email, &req.password).await?;
    let token = issuer::issue(store, user.id, req.device_name.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Log in with email and password
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "jane@example.com", "password": "password123", "device_name": "postman" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed, or
///   `{"errors": {"email": ["These credentials do not match our records."]}}`
///   for an unknown email or wrong password alike
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    ensure_valid(collect_errors(
        &req,
        &[("email", req.email.as_str()), ("password", req.password.as_str())],
    ))?;

    let store = state.store.as_ref();
    let user = credentials::authenticate(store, &req.email, &req.password).await?;
    let token = issuer::issue(store, user.id, req.device_name.as_deref()).await?;

    Ok(Json(AuthResponse { token, user }))
}

/// Revoke the token presented with this request
///
/// Other tokens of the same user stay valid.
///
/// # Endpoint
///
/// ```text
/// POST /auth/logout
/// Authorization: Bearer todo_...
/// ```
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    let token = bearer_token(&headers)?;
    issuer::revoke(state.store.as_ref(), token).await?;

    tracing::info!(user_id = %auth.user_id, token_id = %auth.token_id, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
