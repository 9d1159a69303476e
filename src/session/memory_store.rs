//! In-memory session storage.
//!
//! Sessions are lost when the process restarts; that matches the scope of
//! this service (no persistent session backing store).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::crypto::{generate_token, DEFAULT_TOKEN_LENGTH};
use crate::error::AppError;

use super::repository::SessionRepository;
use super::{Session, SessionData};

/// Stores sessions in a `HashMap` behind a `RwLock`, keyed by session ID.
/// Updates to a single key happen under the write lock, so concurrent
/// touches never lose a refresh.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, data: SessionData) -> Result<String, AppError> {
        let session_id = generate_token(DEFAULT_TOKEN_LENGTH);

        self.sessions
            .write()
            .map_err(|_| AppError::Store("session lock poisoned".to_owned()))?
            .insert(session_id.clone(), data);

        Ok(session_id)
    }

    async fn find(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| AppError::Store("session lock poisoned".to_owned()))?;

        Ok(sessions.get(session_id).map(|data| Session {
            id: session_id.to_owned(),
            data: data.clone(),
        }))
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(data) = self
            .sessions
            .write()
            .map_err(|_| AppError::Store("session lock poisoned".to_owned()))?
            .get_mut(session_id)
        {
            data.last_access_at = at;
        }

        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), AppError> {
        self.sessions
            .write()
            .map_err(|_| AppError::Store("session lock poisoned".to_owned()))?
            .remove(session_id);

        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn destroy_user_sessions(&self, user_id: i64) -> Result<u64, AppError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AppError::Store("session lock poisoned".to_owned()))?;

        let before_count = sessions.len();
        sessions.retain(|_, data| data.user_id != user_id);

        let destroyed = before_count.saturating_sub(sessions.len());
        Ok(u64::try_from(destroyed).unwrap_or(u64::MAX))
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn prune_expired(&self, max_idle: Duration) -> Result<u64, AppError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AppError::Store("session lock poisoned".to_owned()))?;

        let cutoff = Utc::now() - max_idle;
        let before_count = sessions.len();

        sessions.retain(|_, data| data.last_access_at > cutoff);

        let pruned = before_count.saturating_sub(sessions.len());
        Ok(u64::try_from(pruned).unwrap_or(u64::MAX))
    }
}
