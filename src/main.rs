use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use disportal::chat::{ChatClient, UpstreamChatClient};
use disportal::config::AppConfig;
use disportal::crypto::hash_password;
use disportal::http::{router, AppState};
use disportal::rate_limit::InMemoryStore;
use disportal::repository::{InMemoryUserRepository, UserRepository};
use disportal::session::InMemorySessionRepository;

/// How often idle sessions and finished rate-limit windows are swept.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    let users = InMemoryUserRepository::new();
    if config.dev_mode() {
        seed_dev_user(&users).await?;
    }

    let chat = UpstreamChatClient::new(&config.chat)?;
    let session_repo = Arc::new(InMemorySessionRepository::new());
    let rate_store = Arc::new(InMemoryStore::new());

    let port = config.port;
    let state = AppState::new(
        users,
        chat,
        session_repo,
        rate_store.clone(),
        config,
    );

    spawn_maintenance(state.clone(), rate_store);

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server kører på http://localhost:{port}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Development login so the portal is usable before a real user store is
/// wired in. Never runs in production.
async fn seed_dev_user(users: &InMemoryUserRepository) -> anyhow::Result<()> {
    let hashed = hash_password("password123")?;
    users
        .create_user("test@example.com", "Test Bruger", &hashed)
        .await?;

    info!("seeded development user test@example.com");
    Ok(())
}

fn spawn_maintenance<U, C>(state: AppState<U, C>, rate_store: Arc<InMemoryStore>)
where
    U: UserRepository + Clone + Send + Sync + 'static,
    C: ChatClient + Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        interval.tick().await;

        loop {
            interval.tick().await;

            match state.sessions.prune_expired().await {
                Ok(pruned) if pruned > 0 => info!(pruned, "pruned idle sessions"),
                Ok(_) => {}
                Err(err) => warn!(%err, "session pruning failed"),
            }

            rate_store.cleanup_expired();
        }
    });
}
