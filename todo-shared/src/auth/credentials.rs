/// Registration and login against a [`UserStore`]
///
/// Both operations return the user; issuing a token for it is the caller's
/// job (see `auth::issuer`).
///
/// Unknown emails and wrong passwords are indistinguishable to the caller:
/// both return `CredentialError::InvalidCredentials`, and both run one Argon2
/// verification so the response time does not reveal which case occurred.

use std::sync::OnceLock;

use tracing::{debug, info, warn};

use super::password::{hash_password, verify_password, PasswordError};
use crate::models::user::{normalize_email, CreateUser, User};
use crate::store::{StoreError, UserStore};

/// Error type for credential operations
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The email is already registered
    #[error("The email has already been taken.")]
    DuplicateIdentity,

    /// Unknown email or wrong password
    #[error("These credentials do not match our records.")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Hash verified against when the email is unknown
fn dummy_hash() -> Result<&'static str, PasswordError> {
    static DUMMY: OnceLock<String> = OnceLock::new();

    if let Some(hash) = DUMMY.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password("todo-dummy-password")?;
    Ok(DUMMY.get_or_init(|| hash).as_str())
}

/// Creates an account
///
/// The email is normalized before the uniqueness check and insert. A
/// concurrent registration that wins the race still yields
/// `DuplicateIdentity` through the store's unique constraint.
pub async fn register<S>(
    store: &S,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, CredentialError>
where
    S: UserStore + ?Sized,
{
    let email = normalize_email(email);

    if store.find_user_by_email(&email).await?.is_some() {
        debug!("Registration rejected: email taken");
        return Err(CredentialError::DuplicateIdentity);
    }

    let password_hash = hash_password(password)?;

    let user = store
        .insert_user(CreateUser {
            name: name.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => CredentialError::DuplicateIdentity,
            other => CredentialError::Store(other),
        })?;

    info!(user_id = %user.id, "Registered user");
    Ok(user)
}

/// Checks an email/password pair
pub async fn authenticate<S>(store: &S, email: &str, password: &str) -> Result<User, CredentialError>
where
    S: UserStore + ?Sized,
{
    let Some(user) = store.find_user_by_email(email).await? else {
        // Burn the same work as a real check
        let _ = verify_password(password, dummy_hash()?)?;
        debug!("Login failed");
        return Err(CredentialError::InvalidCredentials);
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => {
            info!(user_id = %user.id, "User authenticated");
            Ok(user)
        }
        Ok(false) => {
            debug!("Login failed");
            Err(CredentialError::InvalidCredentials)
        }
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            Err(CredentialError::InvalidCredentials)
        }
    }
}
