//! Fixed-window rate limiting for the chat proxy.

mod limit;
mod limiter;
mod store;

pub use limit::Limit;
pub use limiter::{RateLimitResult, RateLimiter};
pub use store::{InMemoryStore, RateLimitInfo, RateLimitStore};
