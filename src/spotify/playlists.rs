use crate::{
    error::ApiError,
    types::{Paging, Playlist, PlaylistItem, Track},
};

use super::SpotifyClient;

const PLAYLISTS_PAGE: u32 = 50;
const PLAYLIST_TRACKS_PAGE: u32 = 100;

impl SpotifyClient {
    /// All playlists owned or followed by the current user.
    ///
    /// Follows the `next` links of the paging object until Spotify stops
    /// sending one.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Playlist>)` - every page concatenated, in Spotify's order
    /// - `Err(ApiError)` - the first page that failed; earlier pages are
    ///   discarded
    pub async fn playlists(&self, token: &str) -> Result<Vec<Playlist>, ApiError> {
        let first: Paging<Playlist> = self
            .get(
                token,
                "/me/playlists",
                &[("limit", PLAYLISTS_PAGE.to_string())],
            )
            .await?;
        self.collect_pages(token, first).await
    }

    /// Tracks of a playlist. Local files and removed tracks are skipped.
    pub async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<Track>, ApiError> {
        let first: Paging<PlaylistItem> = self
            .get(
                token,
                &format!("/playlists/{}/tracks", playlist_id),
                &[("limit", PLAYLIST_TRACKS_PAGE.to_string())],
            )
            .await?;

        let items = self.collect_pages(token, first).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.track)
            .filter(|track| !track.id.is_empty())
            .collect())
    }

    async fn collect_pages<T>(&self, token: &str, first: Paging<T>) -> Result<Vec<T>, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut next = first.next;
        let mut all = first.items;

        while let Some(url) = next {
            let page: Paging<T> = self.get_url(token, &url, &[]).await?;
            if page.items.is_empty() {
                break;
            }
            all.extend(page.items);
            next = page.next;
        }

        Ok(all)
    }
}
