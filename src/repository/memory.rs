use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AppError;

use super::{User, UserRepository};

/// In-memory user store behind a `Mutex`.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<Vec<User>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(vec![])),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<User>>, AppError> {
        self.users
            .lock()
            .map_err(|_| AppError::Store("user lock poisoned".to_owned()))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let users = self.lock()?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.lock()?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = self.lock()?;
        Ok(users.clone())
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        let mut users = self.lock()?;

        if users.iter().any(|u| u.email == email) {
            return Err(AppError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            email: email.to_owned(),
            name: name.to_owned(),
            hashed_password: hashed_password.to_owned(),
            created_at: now,
            updated_at: now,
        };

        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user_id: i64, name: &str, email: &str) -> Result<User, AppError> {
        let mut users = self.lock()?;
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            name.clone_into(&mut user.name);
            email.clone_into(&mut user.email);
            user.updated_at = Utc::now();
            Ok(user.clone())
        } else {
            Err(AppError::UserNotFound)
        }
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), AppError> {
        let mut users = self.lock()?;
        let len_before = users.len();
        users.retain(|u| u.id != user_id);
        if users.len() < len_before {
            Ok(())
        } else {
            Err(AppError::UserNotFound)
        }
    }
}
