//! Configuration management for spotstats.
//!
//! Configuration comes from environment variables, optionally seeded from
//! `.env` files:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`<data_local_dir>/spotstats/.env`)
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use crate::{error::AppError, queue::RequestQueue, retry::RetryPolicy};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SCOPE: &str =
    "user-read-email user-read-private user-top-read playlist-read-private playlist-read-collaborative";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_CALLBACK_BASE_URL: &str = "http://127.0.0.1:8888";

const MIN_SESSION_SECRET_LEN: usize = 16;

/// Loads environment variables from `.env` files.
///
/// The working directory is tried first, then the `.env` file in the
/// platform-specific local data directory:
/// - Linux: `~/.local/share/spotstats/.env`
/// - macOS: `~/Library/Application Support/spotstats/.env`
/// - Windows: `%LOCALAPPDATA%/spotstats/.env`
///
/// Missing files are not an error; variables may come from the environment
/// alone. Existing variables are never overridden.
pub async fn load_env() -> Result<(), String> {
    dotenv::dotenv().ok();

    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Directory holding the `.env` file and the persisted session.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotstats");
    path
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    /// Key used to sign the persisted session.
    pub session_secret: String,
    /// Base URL Spotify redirects back to; the callback lives at `/callback`.
    pub callback_base_url: String,
    pub server_address: String,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
    /// Never call the audio-features endpoint, always use synthetic values.
    pub force_synthetic_features: bool,
    pub request_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let client_id = required("SPOTIFY_CLIENT_ID")?;
        let client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let session_secret = required("SESSION_SECRET")?;

        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::Config(format!(
                "SESSION_SECRET must be at least {} characters long. \
                Generate one with: openssl rand -base64 32",
                MIN_SESSION_SECRET_LEN
            )));
        }

        let retry = RetryPolicy {
            max_attempts: parsed("RETRY_ATTEMPTS", RetryPolicy::default().max_attempts)?,
            initial_delay: Duration::from_millis(parsed("RETRY_INITIAL_DELAY_MS", 1000)?),
            ..RetryPolicy::default()
        };

        Ok(Config {
            client_id,
            client_secret,
            session_secret,
            callback_base_url: optional("CALLBACK_BASE_URL", DEFAULT_CALLBACK_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            server_address: optional("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            api_url: optional("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            auth_url: optional("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: optional("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
            scope: optional("SPOTIFY_SCOPE", DEFAULT_SCOPE),
            force_synthetic_features: env::var("FORCE_SYNTHETIC_FEATURES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            request_concurrency: parsed("REQUEST_CONCURRENCY", RequestQueue::DEFAULT_CONCURRENCY)?
                .max(1),
            retry,
        })
    }

    /// Redirect URI registered with the Spotify application.
    pub fn redirect_uri(&self) -> String {
        format!("{}/callback", self.callback_base_url)
    }
}

/// Accepts `1`, `true`, `yes` and `on`, case-insensitively.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn required(key: &str) -> Result<String, AppError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Config(format!("{} must be set", key))),
    }
}

fn optional(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value '{}'", key, v))),
        _ => Ok(default),
    }
}
