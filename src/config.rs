//! Process configuration.
//!
//! Everything configurable is read from the environment exactly once at
//! startup into [`AppConfig`]; handlers never touch the environment.
//! Missing values fall back to logged defaults, and `validate` refuses to
//! start a production process on the development session secret.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{info, warn};

use crate::crypto::SecretString;
use crate::session::SessionConfig;

/// Development fallback for `SESSION_SECRET`. Never valid in production.
pub const DEFAULT_SESSION_SECRET: &str = "din-hemmelige-nøgle-her";

/// Danish denial message returned with every 429 from the chat limiter.
pub const RATE_LIMIT_MESSAGE: &str = "For mange forespørgsler. Vent venligst 15 minutter.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Upstream chat API settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: SecretString,
    /// Upper bound on the whole upstream call, connect included.
    pub timeout: StdDuration,
}

/// Fixed-window limit for the chat route group.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::minutes(15),
            message: RATE_LIMIT_MESSAGE.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub port: u16,
    pub public_dir: PathBuf,
    pub protected_dir: PathBuf,
    pub session: SessionConfig,
    pub chat: ChatConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let env: AppEnv = try_load("APP_ENV", "development");

        let secret = match var("SESSION_SECRET") {
            Ok(value) => SecretString::new(value),
            Err(()) => SecretString::new(DEFAULT_SESSION_SECRET),
        };

        let session = SessionConfig {
            cookie_secure: try_load("COOKIE_SECURE", "false"),
            secret,
            ..SessionConfig::default()
        };

        let chat = ChatConfig {
            api_url: try_load(
                "CHAT_API_URL",
                "https://api.deepseek.com/chat/completions",
            ),
            api_key: match var("CHAT_API_KEY") {
                Ok(value) => SecretString::new(value),
                Err(()) => SecretString::new(""),
            },
            timeout: StdDuration::from_secs(try_load("CHAT_TIMEOUT_SECS", "30")),
        };

        Self {
            env,
            port: try_load("PORT", "3000"),
            public_dir: PathBuf::from(try_load::<String>("PUBLIC_DIR", "public")),
            protected_dir: PathBuf::from(try_load::<String>("PROTECTED_DIR", "protected")),
            session,
            chat,
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn dev_mode(&self) -> bool {
        self.env == AppEnv::Development
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.env == AppEnv::Production {
            if self.session.secret.expose_secret() == DEFAULT_SESSION_SECRET {
                return Err("SESSION_SECRET must be set in production");
            }
            if self.session.secret.len() < 32 {
                return Err("SESSION_SECRET should be at least 32 bytes");
            }
        }

        if self.chat.api_key.is_empty() {
            warn!("CHAT_API_KEY is empty, chat proxy calls will fail upstream");
        }

        Ok(())
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("{key} not set, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| default.to_owned());

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value ({e}), using default: {default}");
        default
            .parse()
            .unwrap_or_else(|e| panic!("default for {key} must parse: {e}"))
    })
}
