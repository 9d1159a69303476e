//! End-to-end tests over the full router.
//!
//! The user store, session store, and rate-limit store are the in-memory
//! implementations; the chat upstream is canned. No network required.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use disportal::chat::{ChatError, MockChatClient};
use disportal::config::{
    AppConfig, AppEnv, ChatConfig, RateLimitConfig, RATE_LIMIT_MESSAGE,
};
use disportal::crypto::{hash_password, sign_session_id, SecretString};
use disportal::http::{router, AppState};
use disportal::rate_limit::InMemoryStore;
use disportal::repository::{InMemoryUserRepository, UserRepository};
use disportal::session::{
    InMemorySessionRepository, SessionConfig, SessionData, SessionRepository,
};

type TestState = AppState<InMemoryUserRepository, MockChatClient>;

struct TestApp {
    app: Router,
    state: TestState,
    session_repo: Arc<InMemorySessionRepository>,
}

fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnv::Production,
        port: 0,
        public_dir: PathBuf::from("public"),
        protected_dir: PathBuf::from("protected"),
        session: SessionConfig {
            secret: SecretString::new("e2e-test-secret-key-that-is-long-enough"),
            ..SessionConfig::default()
        },
        chat: ChatConfig {
            api_url: "http://localhost/unused".to_owned(),
            api_key: SecretString::new("unused"),
            timeout: StdDuration::from_secs(5),
        },
        rate_limit: RateLimitConfig::default(),
    }
}

async fn create_app(chat: MockChatClient, config: AppConfig) -> TestApp {
    let users = InMemoryUserRepository::new();
    let hashed = hash_password("securepassword").unwrap();
    users
        .create_user("user@email.com", "Bruger", &hashed)
        .await
        .unwrap();

    let session_repo = Arc::new(InMemorySessionRepository::new());
    let state = AppState::new(
        users,
        chat,
        session_repo.clone(),
        Arc::new(InMemoryStore::new()),
        config,
    );

    TestApp {
        app: router(state.clone()),
        state,
        session_repo,
    }
}

async fn default_app() -> TestApp {
    create_app(MockChatClient::replying(json!({"reply": "hej"})), test_config()).await
}

async fn body_to_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Logs in with the seeded user and returns the `Cookie` header value to
/// send back on subsequent requests.
async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            json!({"email": "user@email.com", "password": "securepassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    cookie_from(&response)
}

fn cookie_from(response: &Response) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn test_login_success_sets_session_cookie() {
    let test = default_app().await;

    let response = test
        .app
        .oneshot(post_json(
            "/auth/login",
            json!({"email": "user@email.com", "password": "securepassword"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("disportal_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=1800"));

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["user"]["email"], "user@email.com");
    assert!(body["user"].get("hashed_password").is_none());
}

#[tokio::test]
async fn test_login_wrong_password_is_401_without_cookie() {
    let test = default_app().await;

    let response = test
        .app
        .oneshot(post_json(
            "/auth/login",
            json!({"email": "user@email.com", "password": "wrongpassword"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "Forkert email eller adgangskode");
}

#[tokio::test]
async fn test_login_missing_fields_is_400() {
    let test = default_app().await;

    let response = test
        .app
        .oneshot(post_json(
            "/auth/login",
            json!({"email": "", "password": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_front_page_requires_session() {
    let test = default_app().await;

    for uri in ["/forside", "/forside.html"] {
        let response = test.app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(response.headers()[header::LOCATION], "/login.html");
    }
}

#[tokio::test]
async fn test_front_page_served_with_session() {
    let test = default_app().await;
    let cookie = login(&test.app).await;

    let response = test
        .app
        .oneshot(get_with_cookie("/forside", &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Forside"));
}

#[tokio::test]
async fn test_root_redirects_authenticated_visitors() {
    let test = default_app().await;
    let cookie = login(&test.app).await;

    let response = test
        .app
        .clone()
        .oneshot(get_with_cookie("/", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/forside");

    let response = test.app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Velkommen"));
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let test = default_app().await;
    let cookie = login(&test.app).await;

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    let response = test
        .app
        .oneshot(get_with_cookie("/forside", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_expired_session_redirects_and_is_destroyed() {
    let test = default_app().await;

    let stale = Utc::now() - Duration::minutes(31);
    let session_id = test
        .session_repo
        .create(SessionData {
            user_id: 1,
            email: "user@email.com".to_owned(),
            name: "Bruger".to_owned(),
            created_at: stale,
            last_access_at: stale,
        })
        .await
        .unwrap();
    let cookie = format!(
        "disportal_session={}",
        sign_session_id(&session_id, &test.state.sessions.config().secret)
    );

    let response = test
        .app
        .oneshot(get_with_cookie("/forside", &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/login.html");
    assert!(test.session_repo.is_empty());
}

#[tokio::test]
async fn test_session_survives_within_idle_window() {
    let test = default_app().await;

    let recent = Utc::now() - Duration::minutes(20);
    let session_id = test
        .session_repo
        .create(SessionData {
            user_id: 1,
            email: "user@email.com".to_owned(),
            name: "Bruger".to_owned(),
            created_at: recent,
            last_access_at: recent,
        })
        .await
        .unwrap();
    let cookie = format!(
        "disportal_session={}",
        sign_session_id(&session_id, &test.state.sessions.config().secret)
    );

    let response = test
        .app
        .oneshot(get_with_cookie("/forside", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The visit refreshed the idle window.
    let stored = test.session_repo.find(&session_id).await.unwrap().unwrap();
    assert!(stored.data.last_access_at > recent);
}

#[tokio::test]
async fn test_tampered_cookie_is_treated_as_absent() {
    let test = default_app().await;

    let response = test
        .app
        .oneshot(get_with_cookie(
            "/forside",
            &format!("disportal_session=fake.{}", "0".repeat(64)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/login.html");
}

#[tokio::test]
async fn test_chat_proxy_relays_completion() {
    let chat = MockChatClient::replying(json!({"reply": "hej"}));
    let test = create_app(chat.clone(), test_config()).await;

    let payload = json!({"messages": [{"role": "user", "content": "hej?"}]});
    let response = test
        .app
        .oneshot(post_json("/api/chat", payload.clone()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await, json!({"reply": "hej"}));
    assert_eq!(chat.calls(), vec![payload]);
}

#[tokio::test]
async fn test_chat_rate_limit_denies_after_budget() {
    let mut config = test_config();
    config.rate_limit.max_requests = 3;
    let chat = MockChatClient::replying(json!({"reply": "hej"}));
    let test = create_app(chat.clone(), config).await;

    let request = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(r#"{"messages": []}"#))
            .unwrap()
    };

    for _ in 0..3 {
        let response = test.app.clone().oneshot(request("203.0.113.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = test.app.clone().oneshot(request("203.0.113.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        body_to_json(response.into_body()).await,
        json!({"error": RATE_LIMIT_MESSAGE})
    );

    // The denied request never reached the upstream.
    assert_eq!(chat.calls().len(), 3);

    // Other clients keep their own budget.
    let response = test.app.oneshot(request("198.51.100.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_upstream_timeout_is_504() {
    let test = create_app(MockChatClient::failing(ChatError::Timeout), test_config()).await;

    let response = test
        .app
        .oneshot(post_json("/api/chat", json!({"messages": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Status kode: 504"));
}

#[tokio::test]
async fn test_chat_upstream_failure_hides_detail_in_production() {
    let chat = MockChatClient::failing(ChatError::Status {
        status: 500,
        body: "internal upstream secret".to_owned(),
    });
    let test = create_app(chat, test_config()).await;

    let response = test
        .app
        .oneshot(post_json("/api/chat", json!({"messages": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Status kode: 502"));
    assert!(!html.contains("internal upstream secret"));
}

#[tokio::test]
async fn test_chat_upstream_failure_shows_detail_in_development() {
    let mut config = test_config();
    config.env = AppEnv::Development;
    let chat = MockChatClient::failing(ChatError::Status {
        status: 500,
        body: "upstream exploded".to_owned(),
    });
    let test = create_app(chat, config).await;

    let response = test
        .app
        .oneshot(post_json("/api/chat", json!({"messages": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("upstream exploded"));
}

#[tokio::test]
async fn test_static_files_and_404_fallback() {
    let test = default_app().await;

    let response = test.app.clone().oneshot(get("/login.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Log ind"));

    let response = test.app.oneshot(get("/findes-ikke")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Status kode: 404"));
    assert!(html.contains("Tilbage til forsiden"));
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let test = default_app().await;

    for uri in ["/", "/login.html", "/findes-ikke"] {
        let response = test.app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(
            response.headers()["x-content-type-options"],
            "nosniff",
            "{uri}"
        );
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN", "{uri}");
    }
}

#[tokio::test]
async fn test_user_crud() {
    let test = default_app().await;

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/users",
            json!({"email": "ny@email.com", "name": "Ny Bruger", "password": "longenoughpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_to_json(response.into_body()).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["email"], "ny@email.com");

    let response = test
        .app
        .clone()
        .oneshot(get(&format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/users/{id}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(
                        &json!({"email": "opdateret@email.com", "name": "Opdateret"}),
                    )
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_to_json(response.into_body()).await;
    assert_eq!(updated["email"], "opdateret@email.com");

    let response = test
        .app
        .clone()
        .oneshot(get("/users"))
        .await
        .unwrap();
    let list = body_to_json(response.into_body()).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test.app.oneshot(get(&format!("/users/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "Brugeren blev ikke fundet");
}

#[tokio::test]
async fn test_deleting_a_user_ends_their_session() {
    let test = default_app().await;
    let cookie = login(&test.app).await;

    // The seeded user has id 1.
    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/users/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .oneshot(get_with_cookie("/forside", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(test.session_repo.is_empty());
}

#[tokio::test]
async fn test_create_user_validation() {
    let test = default_app().await;

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/users",
            json!({"email": "ikke-en-email", "name": "Navn", "password": "longenoughpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/users",
            json!({"email": "ok@email.com", "name": "Navn", "password": "kort"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Seeded email is taken.
    let response = test
        .app
        .oneshot(post_json(
            "/users",
            json!({"email": "user@email.com", "name": "Navn", "password": "longenoughpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"], "Brugeren findes allerede");
}
