use crate::{
    error::ApiError,
    types::{
        Artist, AudioFeatures, AudioFeaturesResponse, FeatureSet, Paging, SeveralArtistsResponse,
        TimeRange, Track,
    },
    warning,
};

use super::{ARTISTS_BATCH, AUDIO_FEATURES_BATCH, SpotifyClient};

/// Spotify caps the top-items endpoints at 50 per page.
pub const MAX_TOP_LIMIT: u32 = 50;

/// Splits `ids` into comma-joined batches of at most `size` ids.
pub fn batch_ids(ids: &[String], size: usize) -> Vec<String> {
    ids.chunks(size.max(1)).map(|chunk| chunk.join(",")).collect()
}

impl SpotifyClient {
    /// `GET /me/top/tracks` for the given listening window.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token with `user-top-read`
    /// * `time_range` - `short_term` (4 weeks), `medium_term` (6 months) or
    ///   `long_term` (years)
    /// * `limit` - Number of tracks, clamped to `1..=MAX_TOP_LIMIT`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Track>)` - the user's top tracks, most played first
    /// - `Err(ApiError)` - after the retry policy gave up
    ///
    /// # Example
    ///
    /// ```
    /// let tracks = client.top_tracks(&token, TimeRange::MediumTerm, 20).await?;
    /// for track in &tracks {
    ///     info!("{} ({})", track.name, track.popularity);
    /// }
    /// ```
    pub async fn top_tracks(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Track>, ApiError> {
        let page: Paging<Track> = self
            .get(
                token,
                "/me/top/tracks",
                &[
                    ("time_range", time_range.to_string()),
                    ("limit", limit.clamp(1, MAX_TOP_LIMIT).to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    /// Full artist objects (with genres), fetched in batches of 50.
    ///
    /// Ids Spotify does not know come back as `null` and are dropped, so the
    /// result can be shorter than `ids`.
    pub async fn artists(&self, token: &str, ids: &[String]) -> Result<Vec<Artist>, ApiError> {
        let mut artists = Vec::with_capacity(ids.len());
        for batch in batch_ids(ids, ARTISTS_BATCH) {
            let res: SeveralArtistsResponse =
                self.get(token, "/artists", &[("ids", batch)]).await?;
            artists.extend(res.artists.into_iter().flatten());
        }
        Ok(artists)
    }

    /// Audio features for the given tracks, batched by 100 ids.
    ///
    /// A 403 means the application has no access to the endpoint; that is
    /// permanent, so every track gets synthetic features instead of retrying.
    /// The same happens when synthetic features are forced by configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(FeatureSet)` - features in request order, with `synthetic` set
    ///   when they were not fetched from Spotify
    /// - `Err(ApiError)` - any other failure
    pub async fn audio_features(&self, token: &str, ids: &[String]) -> Result<FeatureSet, ApiError> {
        if self.force_synthetic_features {
            return Ok(synthetic_features(ids));
        }

        let mut features = Vec::with_capacity(ids.len());
        for batch in batch_ids(ids, AUDIO_FEATURES_BATCH) {
            let res: Result<AudioFeaturesResponse, ApiError> =
                self.get(token, "/audio-features", &[("ids", batch)]).await;

            match res {
                Ok(res) => features.extend(res.audio_features.into_iter().flatten()),
                Err(e) if e.status() == Some(403) => {
                    warning!("Audio features are not available for this app, using neutral defaults");
                    return Ok(synthetic_features(ids));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(FeatureSet {
            features,
            synthetic: false,
        })
    }
}

fn synthetic_features(ids: &[String]) -> FeatureSet {
    FeatureSet {
        features: ids.iter().map(|id| AudioFeatures::synthetic(id)).collect(),
        synthetic: true,
    }
}
