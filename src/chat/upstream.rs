//! Real upstream chat client over HTTPS.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ChatConfig;
use crate::crypto::SecretString;
use crate::error::AppError;

use super::{ChatClient, ChatError};

const MAX_LOGGED_BODY: usize = 512;

#[derive(Clone)]
pub struct UpstreamChatClient {
    http: reqwest::Client,
    api_url: String,
    api_key: SecretString,
}

impl UpstreamChatClient {
    /// Builds a client whose calls are bounded by the configured timeout;
    /// a slow upstream becomes [`ChatError::Timeout`], never a hung request.
    pub fn new(config: &ChatConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Store(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatClient for UpstreamChatClient {
    async fn complete(&self, payload: Value) -> Result<Value, ChatError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(MAX_LOGGED_BODY);

            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout
            } else {
                ChatError::Transport(e.to_string())
            }
        })
    }
}
