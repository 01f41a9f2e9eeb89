use std::{path::PathBuf, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::{AppError, Result},
    management::{
        DashboardStats, RecommendationContext, Recommendations, SessionManager, dashboard,
        recommendations::{self as cascade, MAX_TRACK_SEEDS},
    },
    metrics,
    spotify::{
        OAuthClient, SpotifyClient, recommendations::AuthorizedClient, tracks::MAX_TOP_LIMIT,
    },
    types::{Playlist, TimeRange, Track, UserProfile},
    warning,
};

/// State shared by all dashboard handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: SpotifyClient,
    pub oauth: OAuthClient,
    pub session_secret: String,
    /// Signed session file written by `spotstats auth`.
    pub session_path: PathBuf,
    /// Loaded lazily and dropped again once it demands a new sign-in, so a
    /// sign-in done while the server runs is picked up.
    pub session: Arc<Mutex<Option<SessionManager>>>,
}

impl AppState {
    pub fn new(client: SpotifyClient, oauth: OAuthClient, session_secret: String) -> Self {
        Self {
            client,
            oauth,
            session_secret,
            session_path: SessionManager::default_path(),
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_session_path(mut self, path: PathBuf) -> Self {
        self.session_path = path;
        self
    }

    /// Fresh access token for the next Spotify call.
    ///
    /// # Returns
    ///
    /// - `Ok(String)` - bearer token, refreshed first if it had expired
    /// - `Err(AppError::NotSignedIn)` - no session file yet
    /// - `Err(AppError::ReauthRequired)` - the refresh failed earlier or just
    ///   now; the cached session is discarded and the next call reads the
    ///   session file again
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let manager =
                SessionManager::load_from(&self.session_secret, self.session_path.clone()).await?;
            *guard = Some(manager);
        }

        let result = match guard.as_mut() {
            Some(manager) => manager.access_token(&self.oauth).await,
            None => Err(AppError::NotSignedIn),
        };

        if matches!(result, Err(AppError::ReauthRequired)) {
            *guard = None;
        }
        result
    }
}

/// A track plus the values the dashboard derives from it.
#[derive(Debug, Serialize)]
pub struct TrackView {
    #[serde(flatten)]
    pub track: Track,
    pub obscurity: f64,
    pub album_art: Option<String>,
    pub placeholder: bool,
}

impl From<Track> for TrackView {
    fn from(track: Track) -> Self {
        Self {
            obscurity: metrics::obscurity(track.popularity as f64),
            album_art: track.album_art().map(str::to_string),
            placeholder: track.is_placeholder(),
            track,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopTracksParams {
    pub time_range: Option<TimeRange>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub time_range: Option<TimeRange>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub obscurity: Option<u8>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsView {
    #[serde(flatten)]
    pub recommendations: Recommendations,
    pub notice: Option<String>,
}

/// Query values outside `min..=max` are rejected instead of clamped.
fn in_range<T>(name: &str, value: T, min: T, max: T) -> Result<T>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(AppError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

pub async fn me(State(state): State<AppState>) -> Result<Json<UserProfile>> {
    let token = state.access_token().await?;
    Ok(Json(state.client.current_user(&token).await?))
}

pub async fn top_tracks(
    State(state): State<AppState>,
    Query(params): Query<TopTracksParams>,
) -> Result<Json<Vec<TrackView>>> {
    let limit = in_range("limit", params.limit.unwrap_or(20), 1, MAX_TOP_LIMIT)?;

    let token = state.access_token().await?;
    let tracks = state
        .client
        .top_tracks(&token, params.time_range.unwrap_or_default(), limit)
        .await?;
    Ok(Json(tracks.into_iter().map(TrackView::from).collect()))
}

pub async fn playlists(State(state): State<AppState>) -> Result<Json<Vec<Playlist>>> {
    let token = state.access_token().await?;
    Ok(Json(state.client.playlists(&token).await?))
}

pub async fn playlist_tracks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TrackView>>> {
    let token = state.access_token().await?;
    let tracks = state.client.playlist_tracks(&token, &id).await?;
    Ok(Json(tracks.into_iter().map(TrackView::from).collect()))
}

pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<DashboardStats>> {
    let token = state.access_token().await?;
    let stats =
        dashboard::build_stats(&state.client, &token, params.time_range.unwrap_or_default())
            .await?;
    Ok(Json(stats))
}

pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationsView>> {
    let obscurity = in_range("obscurity", params.obscurity.unwrap_or(50), 0, 100)?;
    let limit = in_range(
        "limit",
        params.limit.unwrap_or(cascade::DEFAULT_LIMIT),
        1,
        cascade::MAX_LIMIT,
    )?;

    let token = state.access_token().await?;

    let seeds = match state
        .client
        .top_tracks(&token, TimeRange::MediumTerm, MAX_TRACK_SEEDS as u32)
        .await
    {
        Ok(tracks) => tracks.into_iter().map(|t| t.id).collect(),
        Err(e) => {
            warning!("Failed to load top tracks for seeding: {}", e);
            Vec::new()
        }
    };

    let ctx = RecommendationContext::new(obscurity, limit, seeds);
    let source = AuthorizedClient {
        client: &state.client,
        token: &token,
    };
    let result = cascade::recommend(&source, &ctx).await;

    let notice = result.fallback.then(|| {
        "Spotify did not return recommendations; showing placeholders instead".to_string()
    });
    Ok(Json(RecommendationsView {
        recommendations: result,
        notice,
    }))
}
