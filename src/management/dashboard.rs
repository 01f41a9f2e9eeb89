use std::collections::HashSet;

use serde::Serialize;

use crate::{
    error::ApiError,
    metrics::{self, BreakdownEntry},
    spotify::{SpotifyClient, tracks::MAX_TOP_LIMIT},
    types::{Artist, FeatureSet, TimeRange, Track},
    warning,
};

/// Everything the statistics view shows for one listening window.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub time_range: TimeRange,
    pub track_count: usize,
    pub obscurity: Option<f64>,
    pub mood: Option<f64>,
    pub diversity: f64,
    pub unique_genres: usize,
    pub genres: Vec<BreakdownEntry>,
    pub eras: Vec<BreakdownEntry>,
    pub most_obscure: Option<Track>,
    /// Mood is based on neutral defaults, not real audio features.
    pub synthetic_features: bool,
    /// User-visible messages about degraded data.
    pub notices: Vec<String>,
}

/// Fetches top tracks, audio features and artist genres, then derives stats.
///
/// Only the top tracks are required. Failing feature or artist lookups leave
/// a notice and the remaining statistics are still returned.
///
/// # Arguments
///
/// * `client` - Spotify client (shares the request queue)
/// * `token` - Valid access token
/// * `time_range` - Listening window of the top tracks
///
/// # Returns
///
/// - `Ok(DashboardStats)` - scores, breakdowns and notices about degraded data
/// - `Err(ApiError)` - the top tracks could not be loaded
///
/// # API Calls
///
/// - `GET /me/top/tracks` (50 tracks)
/// - `GET /audio-features` in batches of 100 ids
/// - `GET /artists` in batches of 50 ids for the genres
pub async fn build_stats(
    client: &SpotifyClient,
    token: &str,
    time_range: TimeRange,
) -> Result<DashboardStats, ApiError> {
    let tracks = client.top_tracks(token, time_range, MAX_TOP_LIMIT).await?;
    let mut notices = Vec::new();

    let track_ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
    let features = match client.audio_features(token, &track_ids).await {
        Ok(features) => Some(features),
        Err(e) => {
            warning!("Failed to load audio features: {}", e);
            notices.push(format!("Mood is unavailable: {}", e));
            None
        }
    };

    let artist_ids = unique_artist_ids(&tracks);
    let artists = match client.artists(token, &artist_ids).await {
        Ok(artists) => artists,
        Err(e) => {
            warning!("Failed to load artist genres: {}", e);
            notices.push(format!("Genre statistics are unavailable: {}", e));
            Vec::new()
        }
    };

    Ok(compute_stats(time_range, tracks, features, &artists, notices))
}

/// Artist ids of the given tracks, first occurrence order, no duplicates.
pub fn unique_artist_ids(tracks: &[Track]) -> Vec<String> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter(|a| !a.id.is_empty())
        .filter(|a| seen.insert(a.id.clone()))
        .map(|a| a.id.clone())
        .collect()
}

/// Derives [`DashboardStats`] from already fetched data.
///
/// `features = None` means the audio features could not be loaded at all, so
/// mood is `None`. Synthetic features and an empty track list add a notice.
pub fn compute_stats(
    time_range: TimeRange,
    tracks: Vec<Track>,
    features: Option<FeatureSet>,
    artists: &[Artist],
    mut notices: Vec<String>,
) -> DashboardStats {
    let synthetic_features = features.as_ref().is_some_and(|f| f.synthetic);
    if synthetic_features {
        notices.push(
            "Audio features are restricted for this app; mood uses neutral defaults".to_string(),
        );
    }
    if tracks.is_empty() {
        notices.push(format!("No top tracks for {} yet", time_range));
    }

    let all_genres: Vec<String> = artists.iter().flat_map(|a| a.genres.clone()).collect();
    let unique = metrics::unique_genres(&all_genres);
    let mut unique_sorted: Vec<String> = unique.iter().cloned().collect();
    unique_sorted.sort();

    let most_obscure = tracks.iter().min_by_key(|t| t.popularity).cloned();

    DashboardStats {
        time_range,
        track_count: tracks.len(),
        obscurity: metrics::average_obscurity(&tracks),
        mood: features.and_then(|f| metrics::average_mood(&f.features)),
        diversity: metrics::diversity(unique.len()),
        unique_genres: unique.len(),
        genres: metrics::genre_breakdown(&unique_sorted),
        eras: metrics::era_breakdown(&tracks),
        most_obscure,
        synthetic_features,
        notices,
    }
}
