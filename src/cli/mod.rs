//! # CLI Module
//!
//! User-facing commands. Each command loads the stored session, talks to
//! Spotify through [`SpotifyClient`] and prints tables or status lines with
//! the crate's output macros.
//!
//! ## Commands
//!
//! - [`auth`] - Sign in with Spotify and store the session
//! - [`profile`] - Show the signed-in user
//! - [`top`] - Top tracks with their obscurity
//! - [`playlists`] - Playlists, or the tracks of one playlist
//! - [`stats`] - Obscurity, mood, diversity and genre/era breakdowns
//! - [`recommend`] - Recommendations through the fallback cascade
//! - [`serve`] - JSON dashboard server
//!
//! Commands never abort because Spotify misbehaves; they print a warning and
//! show whatever data is available. Missing or unusable sessions end the
//! process with a hint to run `spotstats auth`.

use crate::{
    config::Config,
    spotify::{OAuthClient, SpotifyClient},
};

mod auth;
mod playlists;
mod profile;
mod recommend;
mod serve;
mod stats;
mod top;

pub use auth::auth;
pub use playlists::playlists;
pub use profile::profile;
pub use recommend::recommend;
pub use serve::serve;
pub use stats::stats;
pub use top::top;

/// What every command needs: configuration and the two Spotify clients.
pub struct Context {
    pub config: Config,
    pub client: SpotifyClient,
    pub oauth: OAuthClient,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            client: SpotifyClient::from_config(&config),
            oauth: OAuthClient::from_config(&config),
            config,
        }
    }
}
