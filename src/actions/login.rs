use crate::crypto::verify_password;
use crate::error::AppError;
use crate::repository::{User, UserRepository};
use crate::session::SessionManager;

/// Verifies credentials against the user store and opens a session.
///
/// An unknown email and a wrong password are indistinguishable to the
/// caller; no session is created on either.
pub struct LoginAction<U: UserRepository> {
    users: U,
    sessions: SessionManager,
}

impl<U: UserRepository> LoginAction<U> {
    pub fn new(users: U, sessions: SessionManager) -> Self {
        LoginAction { users, sessions }
    }

    /// Returns the authenticated user and the signed session cookie value.
    pub async fn execute(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        if let Some(user) = self.users.find_user_by_email(email).await? {
            if verify_password(password, &user.hashed_password)? {
                let cookie_value = self.sessions.login(&user).await?;
                tracing::info!(user_id = user.id, "login success");
                return Ok((user, cookie_value));
            }
        }

        tracing::warn!("login failed");
        Err(AppError::InvalidCredentials)
    }
}
