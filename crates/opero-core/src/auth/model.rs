use serde::{Deserialize, Serialize};

/// Identity returned by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Auth state change pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
    TokenRefreshed(AuthUser),
    UserUpdated(AuthUser),
}

impl AuthEvent {
    /// The user carried by the event, if the session is still alive.
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthEvent::SignedIn(user)
            | AuthEvent::TokenRefreshed(user)
            | AuthEvent::UserUpdated(user) => Some(user),
            AuthEvent::SignedOut => None,
        }
    }
}
