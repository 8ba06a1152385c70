/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Register, login and logout
/// - `user`: The authenticated user
/// - `todos`: Owner-scoped todo CRUD

use crate::error::{ApiError, ApiResult, FieldErrors};
use validator::Validate;

pub mod auth;
pub mod health;
pub mod todos;
pub mod user;

/// Human form of a field name (`device_name` -> `device name`)
fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

/// Checks presence first, then the derived rules
///
/// A field that is missing or blank only reports "required"; its other rules
/// are skipped, so clients get one actionable message per field.
pub(crate) fn collect_errors<T: Validate>(req: &T, required: &[(&str, &str)]) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (field, value) in required {
        if value.trim().is_empty() {
            errors.insert(
                field.to_string(),
                vec![format!("The {} field is required.", attribute(field))],
            );
        }
    }

    if let Err(e) = req.validate() {
        if let ApiError::Validation(derived) = ApiError::from(e) {
            for (field, messages) in derived {
                errors.entry(field).or_insert(messages);
            }
        }
    }

    errors
}

/// Turns collected field errors into a 422, or passes
pub(crate) fn ensure_valid(errors: FieldErrors) -> ApiResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}
