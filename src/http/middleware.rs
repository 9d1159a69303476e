//! Router-level middleware: security headers and the chat throttle.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::chat::ChatClient;
use crate::error::AppError;
use crate::rate_limit::RateLimitResult;
use crate::repository::UserRepository;

use super::routes::AppState;
use super::CHAT_LIMIT;

/// Baseline security headers on every response, static files included.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

/// Counts the request against the chat limit before it reaches the proxy
/// handler. A denied request is answered here and never goes upstream.
pub async fn throttle_chat<U, C>(
    State(state): State<AppState<U, C>>,
    request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    let key = client_key(&request);

    match state.limiter.hit(CHAT_LIMIT, &key).await {
        Ok(RateLimitResult::Allowed { remaining, .. }) => {
            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response.headers_mut().insert("x-ratelimit-remaining", value);
            }
            response
        }
        Ok(RateLimitResult::Limited {
            retry_after,
            message,
        }) => AppError::RateLimited {
            message,
            retry_after,
        }
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Key the throttle counts against. Proxied deployments hand the client
/// address over in `X-Forwarded-For`; otherwise the socket peer is used.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}
