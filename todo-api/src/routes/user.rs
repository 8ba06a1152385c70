/// Current user endpoint
///
/// `GET /user` returns the account behind the bearer token. The password hash
/// is never serialized.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use todo_shared::{auth::middleware::AuthContext, models::user::User};

/// Returns the authenticated user
///
/// A valid token whose user has since vanished is treated as unauthenticated.
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(user))
}
