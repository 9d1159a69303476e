//! Rate-limit bucket storage.
//!
//! Fixed-window semantics: a bucket whose `reset_at` has passed starts a
//! fresh window (`count = 1`, `reset_at = now + window`) on the next
//! increment. Counts never carry across windows, so a client can burst up
//! to twice the budget across one window boundary; tests pin this down.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;

/// One client's bucket within the current window.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    /// Seconds until the current window ends, floored at zero.
    pub fn available_in(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(0)
    }
}

/// Implement this trait for custom storage (redis, postgres, etc.).
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Counts a request against `key`, creating or resetting the bucket as
    /// needed, and returns the bucket state after the increment. Must be
    /// atomic per key: two simultaneous increments are both counted.
    async fn increment(&self, key: &str, window: Duration) -> Result<RateLimitInfo, AppError>;

    async fn get(&self, key: &str) -> Result<Option<RateLimitInfo>, AppError>;

    async fn reset(&self, key: &str) -> Result<(), AppError>;

    /// Remaining budget without counting a request.
    async fn remaining(&self, key: &str, max_requests: u32) -> Result<u32, AppError> {
        Ok(self.get(key).await?.map_or(max_requests, |info| {
            if info.reset_at < Utc::now() {
                max_requests
            } else {
                max_requests.saturating_sub(info.count)
            }
        }))
    }
}

/// Process-local bucket table. For distributed deployments, swap in a
/// shared store behind the same trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    buckets: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drops buckets whose window has ended; call periodically to bound
    /// memory growth.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        if let Ok(mut buckets) = self.buckets.write() {
            buckets.retain(|_, info| info.reset_at > now);
        }
    }
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl RateLimitStore for InMemoryStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<RateLimitInfo, AppError> {
        let now = Utc::now();

        let mut buckets = self
            .buckets
            .write()
            .map_err(|_| AppError::Store("rate limit lock poisoned".to_owned()))?;

        let info = buckets
            .entry(key.to_owned())
            .and_modify(|info| {
                if info.reset_at <= now {
                    // Window over: start a new one, never accumulate.
                    info.count = 1;
                    info.reset_at = now + window;
                } else {
                    info.count += 1;
                }
            })
            .or_insert_with(|| RateLimitInfo {
                count: 1,
                reset_at: now + window,
            });

        Ok(info.clone())
    }

    async fn get(&self, key: &str) -> Result<Option<RateLimitInfo>, AppError> {
        let buckets = self
            .buckets
            .read()
            .map_err(|_| AppError::Store("rate limit lock poisoned".to_owned()))?;

        Ok(buckets.get(key).cloned())
    }

    async fn reset(&self, key: &str) -> Result<(), AppError> {
        let mut buckets = self
            .buckets
            .write()
            .map_err(|_| AppError::Store("rate limit lock poisoned".to_owned()))?;

        buckets.remove(key);
        Ok(())
    }
}
