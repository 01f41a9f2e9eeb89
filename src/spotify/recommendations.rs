use crate::{
    error::ApiError,
    management::recommendations::{RecommendationQuery, RecommendationSource, Seeds},
    types::{GenreSeedsResponse, RecommendationsResponse, Track},
};

use super::SpotifyClient;

impl SpotifyClient {
    /// `GET /recommendations/available-genre-seeds`
    pub async fn available_genre_seeds(&self, token: &str) -> Result<Vec<String>, ApiError> {
        let res: GenreSeedsResponse = self
            .get(token, "/recommendations/available-genre-seeds", &[])
            .await?;
        Ok(res.genres)
    }

    /// `GET /recommendations` with either genre or track seeds.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token
    /// * `query` - Seeds, `limit` and `target_popularity` of one attempt
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Track>)` - possibly empty; an empty list is not an error
    /// - `Err(ApiError)` - e.g. a 404 when the endpoint is unavailable to
    ///   the application
    pub async fn recommendations(
        &self,
        token: &str,
        query: &RecommendationQuery,
    ) -> Result<Vec<Track>, ApiError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("target_popularity", query.target_popularity.to_string()),
        ];
        match &query.seeds {
            Seeds::Genres(genres) => params.push(("seed_genres", genres.join(","))),
            Seeds::Tracks(tracks) => params.push(("seed_tracks", tracks.join(","))),
        }

        let res: RecommendationsResponse = self.get(token, "/recommendations", &params).await?;
        Ok(res.tracks)
    }
}

/// Binds a client to an access token for the recommendation cascade.
pub struct AuthorizedClient<'a> {
    pub client: &'a SpotifyClient,
    pub token: &'a str,
}

impl RecommendationSource for AuthorizedClient<'_> {
    async fn available_genres(&self) -> Result<Vec<String>, ApiError> {
        self.client.available_genre_seeds(self.token).await
    }

    async fn recommendations(&self, query: &RecommendationQuery) -> Result<Vec<Track>, ApiError> {
        self.client.recommendations(self.token, query).await
    }
}
