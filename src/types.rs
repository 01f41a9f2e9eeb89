use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use tabled::Tabled;

/// Marker prefix of synthetic recommendation ids.
pub const FALLBACK_TRACK_PREFIX: &str = "fallback-";

/// Spotify sends `null` for some fields (local files, playlists without art).
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default, deserialize_with = "null_to_default")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default, deserialize_with = "null_to_default")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub images: Vec<Image>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub release_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, deserialize_with = "null_to_default")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: AlbumRef,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default, deserialize_with = "null_to_default")]
    pub popularity: u8,
    #[serde(default, deserialize_with = "null_to_default")]
    pub uri: String,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn album_art(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(FALLBACK_TRACK_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub tempo: f64,
}

impl AudioFeatures {
    /// Neutral values used when the audio-features endpoint is unavailable.
    pub fn synthetic(id: &str) -> Self {
        Self {
            id: id.to_string(),
            danceability: 0.5,
            energy: 0.5,
            valence: 0.5,
            acousticness: 0.5,
            instrumentalness: 0.5,
            tempo: 120.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// Audio features for a set of tracks and whether they came from Spotify.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSet {
    pub features: Vec<AudioFeatures>,
    pub synthetic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u8,
    #[serde(default, deserialize_with = "null_to_default")]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeveralArtistsResponse {
    #[serde(default)]
    pub artists: Vec<Option<Artist>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub country: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub followers: Followers,
    #[serde(default, deserialize_with = "null_to_default")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub description: String,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub tracks: PlaylistTracksRef,
    #[serde(default, deserialize_with = "null_to_default")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Playlist {
    pub fn art(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<Track>,
}

/// One page of a Spotify paging object.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreSeedsResponse {
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Raw token endpoint response for both code exchange and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Why a session can no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionErrorTag {
    RefreshAccessTokenError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) after which the access token is stale.
    pub expires_at: i64,
    #[serde(default)]
    pub error: Option<SessionErrorTag>,
}

/// Listening window of the top-items endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks
    #[value(name = "short")]
    #[serde(alias = "short")]
    ShortTerm,
    /// Roughly the last six months
    #[default]
    #[value(name = "medium")]
    #[serde(alias = "medium")]
    MediumTerm,
    /// Several years of data
    #[value(name = "long")]
    #[serde(alias = "long")]
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub popularity: u8,
    pub obscurity: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub tracks: u64,
}

#[derive(Tabled)]
pub struct BreakdownTableRow {
    pub label: String,
    pub count: usize,
    pub share: String,
}
