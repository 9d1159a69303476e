//! HTTP surface: router, handlers, extractors, and middleware.

mod extract;
mod handlers;
mod middleware;
mod routes;
mod types;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub use extract::{MaybeSession, RequireSession};
pub use routes::{router, AppState};
pub use types::{
    CreateUserRequest, LoginRequest, LoginResponse, MessageResponse, UpdateUserRequest,
    UserResponse,
};

/// Where unauthenticated visitors to protected pages are sent.
pub const LOGIN_PAGE: &str = "/login.html";

/// Protected landing page path.
pub const FRONT_PAGE: &str = "/forside";

/// Name of the rate limit guarding the chat proxy.
pub const CHAT_LIMIT: &str = "chat";

/// 302 redirect. `Redirect::to` answers 303, which some older clients
/// refuse to follow for GET navigation, so the status is set by hand.
pub fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_owned())],
    )
        .into_response()
}
