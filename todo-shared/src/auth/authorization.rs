/// Per-resource access decisions
///
/// [`decide`] is a pure function of the identity, the action and the
/// resource; it never touches a store. Handlers load the resource first, then
/// ask for a decision, then act.
///
/// # Rules
///
/// 1. No identity: `Unauthenticated`, before anything else is looked at
/// 2. `Create`: `Allow` for any identity
/// 3. The owner-less todo collection: `Allow` for any identity
/// 4. A single todo: `Allow` iff the identity owns it, else `Forbidden`
///
/// # Example
///
/// ```
/// use todo_shared::auth::authorization::{decide, Action, Decision, Resource};
/// use todo_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: Uuid::new_v4(), token_id: Uuid::new_v4() };
///
/// assert_eq!(decide(None, Action::View, Resource::Todos), Decision::Unauthenticated);
/// assert_eq!(decide(Some(&auth), Action::View, Resource::Todos), Decision::Allow);
/// ```

use super::middleware::AuthContext;
use crate::models::todo::Todo;

/// What the caller wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

/// What the caller wants to do it to
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// One todo, already loaded
    Todo(&'a Todo),

    /// The caller's own todo collection
    Todos,
}

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Forbidden,
    Unauthenticated,
}

/// Error form of a non-`Allow` decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("This action is unauthorized.")]
    Forbidden,
}

/// Decides whether `identity` may perform `action` on `resource`
pub fn decide(identity: Option<&AuthContext>, action: Action, resource: Resource<'_>) -> Decision {
    let Some(identity) = identity else {
        return Decision::Unauthenticated;
    };

    if action == Action::Create {
        return Decision::Allow;
    }

    match resource {
        Resource::Todos => Decision::Allow,
        Resource::Todo(todo) if todo.user_id == identity.user_id => Decision::Allow,
        Resource::Todo(_) => Decision::Forbidden,
    }
}

/// [`decide`] as a `Result`, for use with `?`
pub fn authorize(
    identity: Option<&AuthContext>,
    action: Action,
    resource: Resource<'_>,
) -> Result<(), AuthzError> {
    match decide(identity, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Forbidden => Err(AuthzError::Forbidden),
        Decision::Unauthenticated => Err(AuthzError::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    const ALL_ACTIONS: [Action; 4] = [Action::View, Action::Create, Action::Update, Action::Delete];

    fn identity() -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
        }
    }

    fn todo_owned_by(user_id: Uuid) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            user_id,
            title: "Buy milk".to_string(),
            description: None,
            is_completed: false,
            due_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_identity_is_unauthenticated() {
        let todo = todo_owned_by(Uuid::new_v4());

        for action in ALL_ACTIONS {
            assert_eq!(decide(None, action, Resource::Todos), Decision::Unauthenticated);
            assert_eq!(decide(None, action, Resource::Todo(&todo)), Decision::Unauthenticated);
        }
    }

    #[test]
    fn test_owner_is_allowed_everything() {
        let auth = identity();
        let todo = todo_owned_by(auth.user_id);

        for action in ALL_ACTIONS {
            assert_eq!(decide(Some(&auth), action, Resource::Todo(&todo)), Decision::Allow);
        }
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let auth = identity();
        let todo = todo_owned_by(Uuid::new_v4());

        for action in [Action::View, Action::Update, Action::Delete] {
            assert_eq!(
                decide(Some(&auth), action, Resource::Todo(&todo)),
                Decision::Forbidden
            );
        }
    }

    #[test]
    fn test_create_is_allowed_for_any_identity() {
        let auth = identity();
        let foreign = todo_owned_by(Uuid::new_v4());

        assert_eq!(decide(Some(&auth), Action::Create, Resource::Todos), Decision::Allow);
        assert_eq!(
            decide(Some(&auth), Action::Create, Resource::Todo(&foreign)),
            Decision::Allow
        );
    }

    #[test]
    fn test_collection_is_allowed_for_any_identity() {
        let auth = identity();
        assert_eq!(decide(Some(&auth), Action::View, Resource::Todos), Decision::Allow);
    }

    #[test]
    fn test_authorize() {
        let auth = identity();
        let own = todo_owned_by(auth.user_id);
        let foreign = todo_owned_by(Uuid::new_v4());

        assert_eq!(authorize(Some(&auth), Action::Update, Resource::Todo(&own)), Ok(()));
        assert_eq!(
            authorize(Some(&auth), Action::Delete, Resource::Todo(&foreign)),
            Err(AuthzError::Forbidden)
        );
        assert_eq!(
            authorize(None, Action::View, Resource::Todo(&own)),
            Err(AuthzError::Unauthenticated)
        );
    }
}
