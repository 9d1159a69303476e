//! Session extractors.
//!
//! [`RequireSession`] is the page gate: no valid session means a 302 to
//! the login page before the handler runs. [`MaybeSession`] only reports
//! whether a session exists, for routes that branch on it.

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::chat::ChatClient;
use crate::repository::UserRepository;
use crate::session::Session;

use super::routes::AppState;
use super::{found, LOGIN_PAGE};

/// Returns the raw value of the named cookie, if the request carries it.
pub(crate) fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == cookie_name).then(|| value.to_owned())
    })
}

/// Extractor that rejects with a 302 to the login page unless the request
/// carries a valid, unexpired session. Resolving also refreshes the
/// session's idle window.
pub struct RequireSession(pub Session);

impl<U, C> FromRequestParts<AppState<U, C>> for RequireSession
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<U, C>,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(&parts.headers, state).await? {
            Some(session) => Ok(RequireSession(session)),
            None => Err(found(LOGIN_PAGE)),
        }
    }
}

/// Extractor for routes that behave differently with and without a
/// session but reject neither.
pub struct MaybeSession(pub Option<Session>);

impl<U, C> FromRequestParts<AppState<U, C>> for MaybeSession
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<U, C>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve_session(&parts.headers, state).await?))
    }
}

async fn resolve_session<U, C>(
    headers: &HeaderMap,
    state: &AppState<U, C>,
) -> Result<Option<Session>, Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    let Some(cookie_value) = session_cookie(headers, &state.sessions.config().cookie_name) else {
        return Ok(None);
    };

    state
        .sessions
        .resolve(&cookie_value)
        .await
        .map_err(IntoResponse::into_response)
}
