//! Centralized error taxonomy and rendering.
//!
//! Every error a handler or middleware surfaces ends up here. Page routes
//! get an HTML error document; API routes get a JSON `{"error": "..."}`
//! body. Detail (the stack-trace analogue) is attached at construction
//! time by [`ErrorRenderer`] and only in development mode, so a production
//! response can never leak it. Every rendered error is logged server-side.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::chat::ChatError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Forkert email eller adgangskode")]
    InvalidCredentials,

    #[error("{message}")]
    RateLimited { message: String, retry_after: i64 },

    #[error("Siden blev ikke fundet")]
    NotFound,

    #[error("Brugeren blev ikke fundet")]
    UserNotFound,

    #[error("Brugeren findes allerede")]
    UserAlreadyExists,

    #[error("{0}")]
    Validation(String),

    #[error("Adgangskoden kunne ikke behandles")]
    PasswordHash,

    #[error("{message}")]
    Upstream {
        message: String,
        detail: Option<String>,
    },

    #[error("Chat-tjenesten svarede ikke i tide")]
    UpstreamTimeout,

    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },

    /// Storage or wiring failure; the inner description is logged, never shown.
    #[error("Der opstod en serverfejl")]
    Store(String),
}

/// JSON error body. The front end only ever reads the `error` field.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::UserAlreadyExists | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::PasswordHash | AppError::Internal { .. } | AppError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// API-group errors render as JSON; everything else as an HTML page.
    fn is_json(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCredentials
                | AppError::RateLimited { .. }
                | AppError::UserNotFound
                | AppError::UserAlreadyExists
                | AppError::Validation(_)
                | AppError::PasswordHash
        )
    }

    fn detail(&self) -> Option<&str> {
        match self {
            AppError::Internal { detail, .. } | AppError::Upstream { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let detail = match &self {
                AppError::Store(inner) => Some(inner.as_str()),
                other => other.detail(),
            };
            tracing::error!(status = %status.as_u16(), error = %self, detail, "request failed");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %self, "request rejected");
        }

        if self.is_json() {
            let body = Json(ErrorBody {
                error: self.to_string(),
            });
            let mut response = (status, body).into_response();
            if let AppError::RateLimited { retry_after, .. } = &self {
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            return response;
        }

        let page = error_page(status, &self.to_string(), self.detail());
        (status, Html(page)).into_response()
    }
}

/// Renders the Danish error page served for all non-API failures.
fn error_page(status: StatusCode, message: &str, detail: Option<&str>) -> String {
    let code = status.as_u16();
    let stack = detail
        .map(|d| format!("<pre>{}</pre>\n        ", escape_html(d)))
        .unwrap_or_default();

    format!(
        r##"<!DOCTYPE html>
<html lang="da">
<head>
    <title>Fejl {code}</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }}
        h1 {{ color: #d32f2f; }}
        a {{ color: #1976d2; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <h1>{message}</h1>
    <h2>Status kode: {code}</h2>
    {stack}<br><br>
    <a href="/">&#8592; Tilbage til forsiden</a>
</body>
</html>
"##
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Constructs server-side errors and decides whether their detail may be
/// exposed. Outside development mode no response body ever carries detail;
/// the detail is still logged here in full.
#[derive(Debug, Clone, Copy)]
pub struct ErrorRenderer {
    dev_mode: bool,
}

impl ErrorRenderer {
    #[must_use]
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Wraps an unexpected failure as a 500 with a generic message.
    pub fn internal(&self, err: impl std::fmt::Display) -> AppError {
        let detail = err.to_string();
        tracing::error!(%detail, "internal server error");

        AppError::Internal {
            message: "Der opstod en serverfejl".to_owned(),
            detail: self.dev_mode.then_some(detail),
        }
    }

    /// Maps an upstream chat failure to a 502/504 with a generic message.
    pub fn upstream(&self, err: ChatError) -> AppError {
        match err {
            ChatError::Timeout => {
                tracing::warn!("upstream chat call timed out");
                AppError::UpstreamTimeout
            }
            other => {
                let detail = other.to_string();
                tracing::error!(%detail, "upstream chat call failed");

                AppError::Upstream {
                    message: "Chat-tjenesten er ikke tilgængelig i øjeblikket".to_owned(),
                    detail: self.dev_mode.then_some(detail),
                }
            }
        }
    }
}
