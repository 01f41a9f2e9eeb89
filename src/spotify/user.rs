use crate::{error::ApiError, types::UserProfile};

use super::SpotifyClient;

impl SpotifyClient {
    /// `GET /me`
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get(token, "/me", &[]).await
    }
}
