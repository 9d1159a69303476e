//! Session-gated web portal with a rate-limited chat proxy.
//!
//! The crate serves a public login page, gates a protected front page
//! behind server-side sessions with a sliding idle window, and forwards
//! chat requests to an upstream completion API under a fixed-window rate
//! limit. Storage boundaries (users, sessions, rate-limit buckets) are
//! traits with in-memory implementations.

pub mod actions;
pub mod chat;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod repository;
pub mod session;

pub use config::AppConfig;
pub use error::AppError;
pub use http::{router, AppState};
