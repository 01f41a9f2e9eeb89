//! Recommendation fallback cascade.
//!
//! The recommendations endpoint is unreliable on restricted API access tiers,
//! so recommendations are produced by trying an ordered list of strategies
//! until one returns at least one track:
//!
//! 1. genre seed combinations (priority genres Spotify still advertises)
//! 2. shrinking subsets of the user's top-track ids
//! 3. synthetic placeholder tracks, marked with [`FALLBACK_TRACK_PREFIX`]
//!
//! Planning is pure ([`plan_attempts`]); [`recommend`] only drives the plan
//! against a [`RecommendationSource`].

use serde::Serialize;

use crate::{
    error::ApiError,
    types::{ArtistRef, FALLBACK_TRACK_PREFIX, Track},
    utils, warning,
};

/// Genres tried first, in order of preference.
pub const PRIORITY_GENRES: &[&str] = &[
    "pop",
    "rock",
    "indie",
    "electronic",
    "hip-hop",
    "alternative",
    "r-n-b",
    "dance",
    "jazz",
    "soul",
    "folk",
    "metal",
    "classical",
    "country",
    "latin",
    "ambient",
];

pub const GENRES_PER_COMBINATION: usize = 2;
pub const MAX_GENRE_COMBINATIONS: usize = 5;
pub const MAX_TRACK_SEEDS: usize = 5;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Seeds {
    Genres(Vec<String>),
    Tracks(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationQuery {
    pub seeds: Seeds,
    pub target_popularity: u8,
    pub limit: u32,
}

/// Inputs of a recommendation run.
#[derive(Debug, Clone)]
pub struct RecommendationContext {
    /// 0 = mainstream, 100 = as obscure as possible.
    pub obscurity_level: u8,
    pub limit: u32,
    /// Candidate track seeds, usually the user's top tracks.
    pub top_track_ids: Vec<String>,
}

impl RecommendationContext {
    /// Builds the inputs of a recommendation run.
    ///
    /// # Arguments
    ///
    /// * `obscurity_level` - 0 (mainstream) to 100 (deep cuts); larger values
    ///   are treated as 100
    /// * `limit` - Number of tracks to ask for. Clamped to `1..=MAX_LIMIT`, so
    ///   a limit of 0 yields one track. Callers that must honor the exact
    ///   value (the CLI, the dashboard) validate it before getting here.
    /// * `top_track_ids` - Candidate track seeds; invalid ids are skipped later
    pub fn new(obscurity_level: u8, limit: u32, top_track_ids: Vec<String>) -> Self {
        Self {
            obscurity_level: obscurity_level.min(100),
            limit: limit.clamp(1, MAX_LIMIT),
            top_track_ids,
        }
    }

    pub fn target_popularity(&self) -> u8 {
        target_popularity(self.obscurity_level)
    }
}

pub fn target_popularity(obscurity_level: u8) -> u8 {
    100 - obscurity_level.min(100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    GenreSeeds,
    TrackSeeds,
    Placeholder,
}

type Planner = fn(&RecommendationContext, &[String]) -> Vec<Seeds>;

/// Strategies in the order they are tried.
const STRATEGIES: &[(StrategyKind, Planner)] = &[
    (StrategyKind::GenreSeeds, plan_genre_seeds),
    (StrategyKind::TrackSeeds, plan_track_seeds),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: StrategyKind,
    pub query: RecommendationQuery,
}

/// Anything that can answer recommendation requests.
#[allow(async_fn_in_trait)]
pub trait RecommendationSource {
    async fn available_genres(&self) -> Result<Vec<String>, ApiError>;
    async fn recommendations(&self, query: &RecommendationQuery) -> Result<Vec<Track>, ApiError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub tracks: Vec<Track>,
    pub strategy: StrategyKind,
    /// Remote requests issued before a strategy succeeded.
    pub attempts: usize,
    /// Seeds of the successful request.
    pub seeds: Option<Seeds>,
    /// True when `tracks` are placeholders.
    pub fallback: bool,
}

/// Priority genres Spotify advertises, paired up in priority order.
///
/// Genres are matched case-insensitively against [`PRIORITY_GENRES`], kept in
/// that order, chunked into groups of [`GENRES_PER_COMBINATION`] and capped at
/// [`MAX_GENRE_COMBINATIONS`]. An odd genre out forms a group of one.
///
/// # Example
///
/// ```
/// let available = vec!["rock".to_string(), "jazz".to_string(), "pop".to_string()];
/// assert_eq!(
///     genre_combinations(&available),
///     vec![vec!["pop", "rock"], vec!["jazz"]]
/// );
/// ```
pub fn genre_combinations(available: &[String]) -> Vec<Vec<String>> {
    let genres: Vec<String> = PRIORITY_GENRES
        .iter()
        .filter(|g| available.iter().any(|a| a.eq_ignore_ascii_case(g)))
        .map(|g| g.to_string())
        .collect();

    genres
        .chunks(GENRES_PER_COMBINATION)
        .take(MAX_GENRE_COMBINATIONS)
        .map(|c| c.to_vec())
        .collect()
}

/// Valid top-track ids, all of them first, then one fewer each time.
pub fn track_seed_subsets(ids: &[String]) -> Vec<Vec<String>> {
    let valid: Vec<String> = ids
        .iter()
        .filter(|id| utils::is_valid_spotify_id(id))
        .take(MAX_TRACK_SEEDS)
        .cloned()
        .collect();

    (1..=valid.len()).rev().map(|k| valid[..k].to_vec()).collect()
}

fn plan_genre_seeds(_ctx: &RecommendationContext, available: &[String]) -> Vec<Seeds> {
    genre_combinations(available)
        .into_iter()
        .map(Seeds::Genres)
        .collect()
}

fn plan_track_seeds(ctx: &RecommendationContext, _available: &[String]) -> Vec<Seeds> {
    track_seed_subsets(&ctx.top_track_ids)
        .into_iter()
        .map(Seeds::Tracks)
        .collect()
}

/// Every remote attempt of the cascade, in order.
///
/// Genre combinations come first, then track-seed subsets from largest to
/// smallest. Each query carries `target_popularity = 100 - obscurity_level`
/// and the context's limit.
///
/// # Arguments
///
/// * `ctx` - Obscurity level, limit and candidate track seeds
/// * `available_genres` - Genre seeds Spotify advertises; empty when the
///   lookup failed, which leaves out the genre strategy
///
/// # Returns
///
/// The attempts to issue. Empty when there is nothing to seed with, in which
/// case [`recommend`] goes straight to placeholders.
pub fn plan_attempts(ctx: &RecommendationContext, available_genres: &[String]) -> Vec<Attempt> {
    STRATEGIES
        .iter()
        .flat_map(|(strategy, planner)| {
            planner(ctx, available_genres)
                .into_iter()
                .map(move |seeds| Attempt {
                    strategy: *strategy,
                    query: RecommendationQuery {
                        seeds,
                        target_popularity: ctx.target_popularity(),
                        limit: ctx.limit,
                    },
                })
        })
        .collect()
}

/// Synthetic tracks shown when no remote strategy produced anything.
pub fn placeholder_tracks(limit: u32, target_popularity: u8) -> Vec<Track> {
    (0..limit)
        .map(|i| Track {
            id: format!("{}{}", FALLBACK_TRACK_PREFIX, i),
            name: format!("Placeholder recommendation {}", i + 1),
            artists: vec![ArtistRef {
                id: String::new(),
                name: "Unknown artist".to_string(),
            }],
            popularity: target_popularity,
            ..Track::default()
        })
        .collect()
}

/// Runs the cascade and never fails; the worst case is placeholders.
///
/// Attempts are issued one after another and the first one returning at least
/// one track wins; its tracks are returned unchanged. Empty answers and errors
/// are logged with [`warning!`](crate::warning) and the next attempt follows,
/// except for a 401, which ends the cascade because the remaining attempts
/// would be rejected as well.
///
/// # Arguments
///
/// * `source` - Where recommendations come from, usually an
///   [`AuthorizedClient`](crate::spotify::recommendations::AuthorizedClient)
/// * `ctx` - Obscurity level, limit and track seeds
///
/// # Returns
///
/// [`Recommendations`] with the winning strategy and seeds, the number of
/// remote attempts made and `fallback = true` when the tracks are placeholders
/// (ids prefixed with [`FALLBACK_TRACK_PREFIX`]).
///
/// # Example
///
/// ```
/// let ctx = RecommendationContext::new(80, 20, top_track_ids);
/// let source = AuthorizedClient { client: &client, token: &token };
/// let result = recommend(&source, &ctx).await;
/// if result.fallback {
///     warning!("Showing placeholders");
/// }
/// ```
pub async fn recommend<S>(source: &S, ctx: &RecommendationContext) -> Recommendations
where
    S: RecommendationSource,
{
    let available = match source.available_genres().await {
        Ok(genres) => genres,
        Err(e) => {
            warning!("Genre seeds unavailable, skipping genre recommendations: {}", e);
            Vec::new()
        }
    };

    let mut attempts = 0;
    for attempt in plan_attempts(ctx, &available) {
        attempts += 1;
        match source.recommendations(&attempt.query).await {
            Ok(tracks) if !tracks.is_empty() => {
                return Recommendations {
                    tracks,
                    strategy: attempt.strategy,
                    attempts,
                    seeds: Some(attempt.query.seeds),
                    fallback: false,
                };
            }
            Ok(_) => warning!("No recommendations for {:?}", attempt.query.seeds),
            Err(e @ ApiError::Unauthorized(_)) => {
                warning!("Recommendations rejected the access token: {}", e);
                break;
            }
            Err(e) => warning!("Recommendations for {:?} failed: {}", attempt.query.seeds, e),
        }
    }

    warning!("Every recommendation strategy failed, showing placeholders");
    Recommendations {
        tracks: placeholder_tracks(ctx.limit, ctx.target_popularity()),
        strategy: StrategyKind::Placeholder,
        attempts,
        seeds: None,
        fallback: true,
    }
}
