//! Session storage trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;

use super::{Session, SessionData};

/// Injected session store. The in-memory implementation backs single
/// instance deployments; a distributed store can replace it without
/// touching route logic. All mutation goes through [`super::SessionManager`].
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Creates a new session and returns its server-generated ID.
    async fn create(&self, data: SessionData) -> Result<String, AppError>;

    /// Finds a session by its ID. Expiry is the manager's concern.
    async fn find(&self, session_id: &str) -> Result<Option<Session>, AppError>;

    /// Refreshes a session's `last_access_at` (sliding expiration).
    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Destroys a session. Destroying an absent session is a no-op.
    async fn destroy(&self, session_id: &str) -> Result<(), AppError>;

    /// Destroys every session belonging to a user, e.g. when the user is
    /// deleted. Returns the number of sessions destroyed.
    async fn destroy_user_sessions(&self, user_id: i64) -> Result<u64, AppError>;

    /// Removes sessions idle longer than `max_idle`.
    ///
    /// Returns the number of sessions pruned.
    async fn prune_expired(&self, max_idle: Duration) -> Result<u64, AppError>;
}
