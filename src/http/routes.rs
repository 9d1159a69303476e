//! Router assembly and shared application state.

use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::chat::ChatClient;
use crate::config::AppConfig;
use crate::error::ErrorRenderer;
use crate::rate_limit::{Limit, RateLimitStore, RateLimiter};
use crate::repository::UserRepository;
use crate::session::{SessionManager, SessionRepository};

use super::middleware::{security_headers, throttle_chat};
use super::{handlers, CHAT_LIMIT};

/// Everything handlers share. Generic over the user store and the chat
/// client so tests can swap in in-memory and canned implementations.
#[derive(Clone)]
pub struct AppState<U, C> {
    pub users: U,
    pub sessions: SessionManager,
    pub limiter: RateLimiter,
    pub chat: C,
    pub config: Arc<AppConfig>,
    pub errors: ErrorRenderer,
}

impl<U, C> AppState<U, C>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    pub fn new(
        users: U,
        chat: C,
        session_repo: Arc<dyn SessionRepository>,
        rate_store: Arc<dyn RateLimitStore>,
        config: AppConfig,
    ) -> Self {
        let sessions = SessionManager::new(session_repo, config.session.clone());

        let chat_limit = Limit::new(config.rate_limit.max_requests, config.rate_limit.window)
            .message(config.rate_limit.message.clone());
        let limiter = RateLimiter::new(rate_store).for_(CHAT_LIMIT, chat_limit);

        let errors = ErrorRenderer::new(config.dev_mode());

        Self {
            users,
            sessions,
            limiter,
            chat,
            config: Arc::new(config),
            errors,
        }
    }
}

/// Builds the full application router.
///
/// Unmatched paths fall through to the public static directory; what the
/// directory cannot answer either becomes the HTML 404 page.
pub fn router<U, C>(state: AppState<U, C>) -> Router
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    let auth_routes = Router::new()
        .route("/login", post(handlers::login::<U, C>))
        .route("/logout", post(handlers::logout::<U, C>));

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::<U, C>))
        .layer(from_fn_with_state(state.clone(), throttle_chat::<U, C>));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::list_users::<U, C>).post(handlers::create_user::<U, C>),
        )
        .route(
            "/{id}",
            get(handlers::get_user::<U, C>)
                .put(handlers::update_user::<U, C>)
                .delete(handlers::delete_user::<U, C>),
        );

    let static_files = ServeDir::new(&state.config.public_dir)
        .not_found_service(handlers::not_found.into_service());

    Router::new()
        .route("/", get(handlers::root::<U, C>))
        .route("/forside", get(handlers::forside::<U, C>))
        .route("/forside.html", get(handlers::forside::<U, C>))
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .nest("/users", user_routes)
        .fallback_service(static_files)
        .layer(from_fn(security_headers))
        .with_state(state)
}
