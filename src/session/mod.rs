//! Server-side sessions with a sliding idle window.
//!
//! A session is valid only while it keeps being used: every successful
//! resolve refreshes `last_access_at`, and a session idle for longer than
//! [`SessionConfig::max_idle`] is indistinguishable from one that never
//! existed.

mod config;
mod manager;
mod memory_store;
mod repository;

use chrono::{DateTime, Duration, Utc};
pub use config::{SameSite, SessionConfig};
pub use manager::SessionManager;
pub use memory_store::InMemorySessionRepository;
pub use repository::SessionRepository;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub data: SessionData,
}

impl Session {
    pub fn new(id: String, data: SessionData) -> Self {
        Self { id, data }
    }

    /// A session expires once it has been idle longer than `max_idle`.
    pub fn is_expired(&self, max_idle: Duration) -> bool {
        Utc::now() - self.data.last_access_at > max_idle
    }
}
