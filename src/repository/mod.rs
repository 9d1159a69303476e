//! User store boundary.
//!
//! Credential verification and user CRUD are delegated through
//! [`UserRepository`]; the portal itself never owns user data. The
//! in-memory implementation serves tests and single-instance deployments.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use memory::InMemoryUserRepository;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> Result<User, AppError>;
    async fn update_user(&self, user_id: i64, name: &str, email: &str) -> Result<User, AppError>;
    async fn delete_user(&self, user_id: i64) -> Result<(), AppError>;
}
