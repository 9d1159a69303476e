use std::collections::HashMap;
use std::sync::Arc;

use super::limit::Limit;
use super::store::RateLimitStore;
use crate::error::AppError;

/// Result of a rate limit check. Denial is a value, not an error; the
/// caller decides how to answer the client.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        reset_at: chrono::DateTime<chrono::Utc>,
    },
    Limited {
        retry_after: i64,
        message: String,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }
}

/// Rate limiter with named limit configurations over an injected store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limits: HashMap<String, Limit>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            limits: HashMap::new(),
        }
    }

    /// Registers a named rate limit.
    #[must_use]
    pub fn for_(mut self, name: impl Into<String>, limit: Limit) -> Self {
        self.limits.insert(name.into(), limit);
        self
    }

    pub fn get_limit(&self, name: &str) -> Option<&Limit> {
        self.limits.get(name)
    }

    /// Counts a request against a named limit and reports the verdict.
    pub async fn hit(&self, limit_name: &str, key: &str) -> Result<RateLimitResult, AppError> {
        let limit = self
            .limits
            .get(limit_name)
            .ok_or_else(|| AppError::Store(format!("rate limit '{limit_name}' not configured")))?;

        let full_key = format!("{limit_name}:{key}");
        let info = self.store.increment(&full_key, limit.window).await?;

        if info.count > limit.max_requests {
            let message = limit
                .get_message()
                .unwrap_or("For mange forespørgsler. Prøv igen senere.")
                .to_owned();

            Ok(RateLimitResult::Limited {
                retry_after: info.available_in(),
                message,
            })
        } else {
            Ok(RateLimitResult::Allowed {
                remaining: limit.max_requests - info.count,
                reset_at: info.reset_at,
            })
        }
    }

    /// Remaining budget for a key without counting a request.
    pub async fn remaining(&self, limit_name: &str, key: &str) -> Result<u32, AppError> {
        let limit = self
            .limits
            .get(limit_name)
            .ok_or_else(|| AppError::Store(format!("rate limit '{limit_name}' not configured")))?;

        let full_key = format!("{limit_name}:{key}");
        self.store.remaining(&full_key, limit.max_requests).await
    }

    /// Clears the budget for a key.
    pub async fn clear(&self, limit_name: &str, key: &str) -> Result<(), AppError> {
        let full_key = format!("{limit_name}:{key}");
        self.store.reset(&full_key).await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limits", &self.limits.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
