//! Session lifecycle owner.
//!
//! The manager is the only component that creates, refreshes, or destroys
//! sessions. Callers hand it raw cookie values; it answers with a valid
//! session or nothing. An expired session is destroyed on discovery, so
//! Expired and Absent are the same thing everywhere downstream.

use std::sync::Arc;

use chrono::Utc;

use crate::crypto::{sign_session_id, verify_signed_cookie};
use crate::error::AppError;
use crate::repository::User;

use super::{Session, SessionConfig, SessionData, SessionRepository};

#[derive(Clone)]
pub struct SessionManager {
    repo: Arc<dyn SessionRepository>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn SessionRepository>, config: SessionConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a session for an authenticated user and returns the signed
    /// cookie value to hand to the client.
    pub async fn login(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let data = SessionData {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: now,
            last_access_at: now,
        };

        let session_id = self.repo.create(data).await?;
        tracing::info!(user_id = user.id, "session created");

        Ok(sign_session_id(&session_id, &self.config.secret))
    }

    /// Resolves a raw cookie value to a valid session, refreshing its idle
    /// window. Tampered, unknown, and expired cookies all come back `None`.
    pub async fn resolve(&self, cookie_value: &str) -> Result<Option<Session>, AppError> {
        let Some(session_id) = verify_signed_cookie(cookie_value, &self.config.secret) else {
            return Ok(None);
        };

        let Some(mut session) = self.repo.find(&session_id).await? else {
            return Ok(None);
        };

        if session.is_expired(self.config.max_idle) {
            self.repo.destroy(&session_id).await?;
            tracing::debug!("expired session destroyed on access");
            return Ok(None);
        }

        let now = Utc::now();
        self.repo.touch(&session_id, now).await?;
        session.data.last_access_at = now;

        Ok(Some(session))
    }

    /// Destroys the session behind a cookie value, if any.
    pub async fn logout(&self, cookie_value: &str) -> Result<(), AppError> {
        if let Some(session_id) = verify_signed_cookie(cookie_value, &self.config.secret) {
            self.repo.destroy(&session_id).await?;
            tracing::info!("session destroyed on logout");
        }

        Ok(())
    }

    /// Destroys every session a user holds; used when the user is removed.
    pub async fn destroy_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let destroyed = self.repo.destroy_user_sessions(user_id).await?;
        if destroyed > 0 {
            tracing::info!(user_id, destroyed, "user sessions destroyed");
        }
        Ok(destroyed)
    }

    /// Removes idle sessions; meant for a periodic maintenance task.
    pub async fn prune_expired(&self) -> Result<u64, AppError> {
        self.repo.prune_expired(self.config.max_idle).await
    }

    /// `Set-Cookie` header value carrying a signed session cookie.
    pub fn set_cookie(&self, signed_value: &str) -> String {
        self.format_cookie(signed_value, self.config.max_idle.num_seconds())
    }

    /// `Set-Cookie` header value that clears the session cookie.
    pub fn clear_cookie(&self) -> String {
        self.format_cookie("", 0)
    }

    fn format_cookie(&self, value: &str, max_age: i64) -> String {
        let config = &self.config;
        let http_only = if config.cookie_http_only {
            "; HttpOnly"
        } else {
            ""
        };
        let secure = if config.cookie_secure { "; Secure" } else { "" };

        format!(
            "{}={value}; Path={}; SameSite={}; Max-Age={max_age}{http_only}{secure}",
            config.cookie_name, config.cookie_path, config.cookie_same_site,
        )
    }
}
