use tracing::info;

use crate::api::ApiError;
use crate::db::{LoginRequest, RegisterRequest, Role, Session, Store, User, SESSION_KEY, USERS_KEY};

/// Generate a unique user id
fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// All registered users, in registration order
pub fn list_users(store: &Store) -> Vec<User> {
    store.read_or(USERS_KEY, Vec::new())
}

/// Register a new account.
///
/// Emails are unique across both roles, compared case-insensitively.
pub fn register(store: &Store, request: RegisterRequest) -> Result<User, ApiError> {
    let user = store.update(USERS_KEY, Vec::<User>::new(), |users| {
        if users.iter().any(|u| u.has_email(&request.email)) {
            return Err(ApiError::DuplicateEmail);
        }

        let user = User {
            id: generate_id(),
            name: request.name,
            email: request.email,
            password_hash: request.password,
            role: request.role,
        };
        users.push(user.clone());
        Ok(user)
    })?;

    info!(user_id = %user.id, role = %user.role, "Registered user {}", user.email);
    Ok(user)
}

/// Log in and make the matching user the current session.
///
/// Unknown email, wrong password and wrong role all yield the same
/// `InvalidCredentials` error.
pub fn login(store: &Store, request: LoginRequest) -> Result<User, ApiError> {
    let user = list_users(store)
        .into_iter()
        .find(|u| {
            u.has_email(&request.email)
                && u.password_hash == request.password
                && u.role == request.role
        })
        .ok_or(ApiError::InvalidCredentials)?;

    store.write(SESSION_KEY, &Some(Session::from(&user)))?;

    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(user)
}

/// Clear the current session. Safe to call when nobody is logged in.
pub fn logout(store: &Store) -> Result<(), ApiError> {
    store.write(SESSION_KEY, &None::<Session>)?;
    Ok(())
}

/// The current session, if any
pub fn current_session(store: &Store) -> Option<Session> {
    store.read_or(SESSION_KEY, None)
}

/// The current session if it belongs to `role`
pub fn require_role(store: &Store, role: Role) -> Result<Session, ApiError> {
    current_session(store)
        .filter(|s| s.role == role)
        .ok_or(ApiError::InvalidCredentials)
}
