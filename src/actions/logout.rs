use crate::error::AppError;
use crate::session::SessionManager;

/// Destroys the session behind a cookie value. A cookie that no longer
/// maps to a session still logs out cleanly.
pub struct LogoutAction {
    sessions: SessionManager,
}

impl LogoutAction {
    pub fn new(sessions: SessionManager) -> Self {
        LogoutAction { sessions }
    }

    pub async fn execute(&self, cookie_value: &str) -> Result<(), AppError> {
        self.sessions.logout(cookie_value).await?;
        tracing::info!("logout success");
        Ok(())
    }
}
