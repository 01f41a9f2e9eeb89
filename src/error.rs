use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the Spotify Web API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Spotify rejected the access token (401): {0}")]
    Unauthorized(String),

    #[error("Spotify denied access (403): {0}")]
    Forbidden(String),

    #[error("Spotify rate limit hit (429)")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Spotify responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode Spotify response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Spotify kept rate limiting the request after {attempts} attempts, try again later")]
    RateLimitExhausted { attempts: u32 },

    #[error("Request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Classifies a non-success response.
    pub fn from_status(status: u16, retry_after: Option<Duration>, message: String) -> Self {
        match status {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            429 => ApiError::RateLimited { retry_after },
            _ => ApiError::Status { status, message },
        }
    }

    /// 401 and 403 are never transient.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::Forbidden(_))
    }

    /// HTTP status behind the error, looking through retry exhaustion.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::RateLimited { .. } | ApiError::RateLimitExhausted { .. } => Some(429),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::RetriesExhausted { source, .. } => source.status(),
            ApiError::Decode(_) => None,
        }
    }
}

/// Application level failures, also used as the dashboard's error response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session expired and could not be refreshed. Please sign in again with `spotstats auth`")]
    ReauthRequired,

    #[error("Not signed in. Run `spotstats auth` first")]
    NotSignedIn,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::ReauthRequired | AppError::NotSignedIn => StatusCode::UNAUTHORIZED,
            AppError::Api(api) if api.is_auth() => StatusCode::UNAUTHORIZED,
            AppError::Api(ApiError::RateLimitExhausted { .. }) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Session(_) | AppError::Io(_) | AppError::Serde(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let reauth = status == StatusCode::UNAUTHORIZED;
        let body = Json(json!({
            "error": self.to_string(),
            "reauth": reauth,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
