//! # Spotify Integration Module
//!
//! Thin client over the Spotify Web API endpoints spotstats needs. Every call
//! goes through the [`with_retry`] wrapper, and every attempt waits for a slot
//! in the shared [`RequestQueue`] (at most three requests in flight):
//!
//! ```text
//! caller (CLI command, dashboard handler)
//!          ↓
//! SpotifyClient method            (bearer token from the session)
//!          ↓
//! with_retry                      (401/403 fail fast, 429 honors retry-after)
//!          ↓
//! RequestQueue::run               (one slot per attempt, FIFO)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Submodules
//!
//! - [`auth`] - OAuth authorization URL, code exchange and refresh-token grant
//! - [`user`] - Current user's profile
//! - [`tracks`] - Top tracks, artists and batched audio features
//! - [`playlists`] - Playlists and playlist tracks with pagination
//! - [`recommendations`] - Genre seeds and the recommendations endpoint

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, header::RETRY_AFTER};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::ApiError,
    queue::RequestQueue,
    retry::{RetryPolicy, with_retry},
};

pub mod auth;
pub mod playlists;
pub mod recommendations;
pub mod tracks;
pub mod user;

pub use auth::OAuthClient;

/// Maximum number of ids the audio-features endpoint accepts per call.
pub const AUDIO_FEATURES_BATCH: usize = 100;
/// Maximum number of ids the several-artists endpoint accepts per call.
pub const ARTISTS_BATCH: usize = 50;

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    queue: RequestQueue,
    retry: RetryPolicy,
    force_synthetic_features: bool,
}

impl SpotifyClient {
    pub fn new(api_url: impl Into<String>, queue: RequestQueue, retry: RetryPolicy) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into(),
            queue,
            retry,
            force_synthetic_features: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_url.clone(),
            RequestQueue::new(config.request_concurrency),
            config.retry,
        )
        .with_synthetic_features(config.force_synthetic_features)
    }

    pub fn with_synthetic_features(mut self, force: bool) -> Self {
        self.force_synthetic_features = force;
        self
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// GET `path` (relative to the API base URL) and decode the JSON body.
    pub(crate) async fn get<T>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.api_url, path);
        self.get_url(token, &url, query).await
    }

    /// GET an absolute URL, used for the `next` links of paging objects.
    pub(crate) async fn get_url<T>(
        &self,
        token: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let (http, queue) = (&self.http, &self.queue);
        // each attempt queues on its own, backoff sleeps hold no slot
        with_retry(&self.retry, move || {
            let request = http.get(url).bearer_auth(token).query(query);
            queue.run(send_json::<T>(request))
        })
        .await
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let response = check_status(response).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Turns a non-success response into a classified [`ApiError`].
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let message = response.text().await.unwrap_or_default();

    Err(ApiError::from_status(
        status.as_u16(),
        retry_after,
        error_message(&message),
    ))
}

/// `retry-after` carries whole (sometimes fractional) seconds.
///
/// # Example
///
/// ```
/// assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

/// Pulls `error.message` (Web API) or `error_description` (accounts service)
/// out of an error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    json["error"]["message"]
        .as_str()
        .or_else(|| json["error_description"].as_str())
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
