//! Route handlers.

use std::path::Path as FsPath;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::actions::{LoginAction, LogoutAction};
use crate::chat::ChatClient;
use crate::crypto::hash_password;
use crate::error::{AppError, ErrorRenderer};
use crate::repository::UserRepository;

use super::extract::{session_cookie, MaybeSession, RequireSession};
use super::routes::AppState;
use super::types::{
    CreateUserRequest, LoginRequest, LoginResponse, MessageResponse, UpdateUserRequest,
    UserResponse,
};
use super::{found, FRONT_PAGE};

/// The landing route inverts the page gate: a visitor who already has a
/// session is sent straight to the front page.
pub async fn root<U, C>(
    State(state): State<AppState<U, C>>,
    MaybeSession(session): MaybeSession,
) -> Result<Response, Response>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    if session.is_some() {
        return Ok(found(FRONT_PAGE));
    }

    serve_page(state.config.public_dir.join("index.html"), &state.errors)
        .await
        .map(IntoResponse::into_response)
        .map_err(IntoResponse::into_response)
}

/// Protected front page. The gate in [`RequireSession`] has already
/// redirected anyone without a valid session.
pub async fn forside<U, C>(
    State(state): State<AppState<U, C>>,
    RequireSession(session): RequireSession,
) -> Result<Html<String>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    tracing::debug!(user_id = session.data.user_id, "front page served");
    serve_page(state.config.protected_dir.join("forside.html"), &state.errors).await
}

async fn serve_page(path: impl AsRef<FsPath>, errors: &ErrorRenderer) -> Result<Html<String>, AppError> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Html(contents)),
        Err(err) => Err(errors.internal(format!("failed to read {}: {err}", path.display()))),
    }
}

pub async fn login<U, C>(
    State(state): State<AppState<U, C>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email og adgangskode er påkrævet".to_owned(),
        ));
    }

    let action = LoginAction::new(state.users.clone(), state.sessions.clone());
    let (user, cookie_value) = action.execute(&body.email, &body.password).await?;

    let response = Json(LoginResponse {
        message: "Login succesfuldt".to_owned(),
        user: user.into(),
    });

    Ok((
        [(header::SET_COOKIE, state.sessions.set_cookie(&cookie_value))],
        response,
    )
        .into_response())
}

/// Logout always succeeds; a missing or stale cookie still gets cleared.
pub async fn logout<U, C>(
    State(state): State<AppState<U, C>>,
    headers: axum::http::HeaderMap,
) -> Result<Response, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    if let Some(cookie_value) = session_cookie(&headers, &state.sessions.config().cookie_name) {
        LogoutAction::new(state.sessions.clone())
            .execute(&cookie_value)
            .await?;
    }

    Ok((
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Json(MessageResponse {
            message: "Du er nu logget ud".to_owned(),
        }),
    )
        .into_response())
}

/// Forwards the chat payload to the upstream API and relays the
/// completion verbatim. Rate limiting happened in the middleware.
pub async fn chat<U, C>(
    State(state): State<AppState<U, C>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    let completion = state
        .chat
        .complete(payload)
        .await
        .map_err(|err| state.errors.upstream(err))?;

    Ok(Json(completion))
}

pub async fn list_users<U, C>(
    State(state): State<AppState<U, C>>,
) -> Result<Json<Vec<UserResponse>>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user<U, C>(
    State(state): State<AppState<U, C>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    let user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(user.into()))
}

pub async fn create_user<U, C>(
    State(state): State<AppState<U, C>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    if !body.email.contains('@') {
        return Err(AppError::Validation("Ugyldig email".to_owned()));
    }
    if body.password.len() < 8 {
        return Err(AppError::Validation(
            "Adgangskoden skal være mindst 8 tegn".to_owned(),
        ));
    }

    let hashed = hash_password(&body.password)?;
    let user = state
        .users
        .create_user(&body.email, &body.name, &hashed)
        .await?;

    tracing::info!(user_id = user.id, "user created");
    Ok(Json(user.into()))
}

pub async fn update_user<U, C>(
    State(state): State<AppState<U, C>>,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    if !body.email.contains('@') {
        return Err(AppError::Validation("Ugyldig email".to_owned()));
    }

    let user = state
        .users
        .update_user(user_id, &body.name, &body.email)
        .await?;

    Ok(Json(user.into()))
}

pub async fn delete_user<U, C>(
    State(state): State<AppState<U, C>>,
    Path(user_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    state.users.delete_user(user_id).await?;
    // A deleted user must not stay logged in.
    state.sessions.destroy_for_user(user_id).await?;

    Ok(Json(MessageResponse {
        message: "Brugeren er slettet".to_owned(),
    }))
}

/// Fallback for paths the static directory cannot answer either.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
