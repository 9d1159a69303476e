//! Upstream chat API boundary.
//!
//! The portal forwards chat payloads verbatim and returns completions
//! verbatim; nothing here interprets either side. The trait keeps the
//! upstream swappable and lets tests assert that denied requests never
//! reach it.

mod upstream;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
pub use upstream::UpstreamChatClient;

#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Forwards an opaque chat payload and returns the opaque completion.
    async fn complete(&self, payload: Value) -> Result<Value, ChatError>;
}

/// Canned chat client for tests. Records every payload it receives so
/// tests can assert which requests actually reached "upstream".
#[derive(Clone)]
pub struct MockChatClient {
    response: Result<Value, ChatError>,
    calls: std::sync::Arc<std::sync::Mutex<Vec<Value>>>,
}

impl MockChatClient {
    pub fn replying(response: Value) -> Self {
        Self {
            response: Ok(response),
            calls: std::sync::Arc::new(std::sync::Mutex::new(vec![])),
        }
    }

    pub fn failing(err: ChatError) -> Self {
        Self {
            response: Err(err),
            calls: std::sync::Arc::new(std::sync::Mutex::new(vec![])),
        }
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, payload: Value) -> Result<Value, ChatError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(payload);
        }
        self.response.clone()
    }
}
