//! # API Module
//!
//! HTTP handlers served by spotstats' local servers.
//!
//! ## Endpoints
//!
//! ### Sign-in
//!
//! - [`callback`] - Spotify redirects here after the user granted access. The
//!   handler checks the `state` parameter, exchanges the code for tokens and
//!   hands the new session to the waiting `auth` command.
//!
//! ### Dashboard (JSON)
//!
//! - [`dashboard::me`] - `GET /api/me`
//! - [`dashboard::top_tracks`] - `GET /api/top-tracks?time_range=&limit=`
//! - [`dashboard::playlists`] - `GET /api/playlists`
//! - [`dashboard::playlist_tracks`] - `GET /api/playlists/{id}/tracks`
//! - [`dashboard::stats`] - `GET /api/stats?time_range=`
//! - [`dashboard::recommendations`] - `GET /api/recommendations?obscurity=&limit=`
//!
//! Failures are returned as `{ "error": ..., "reauth": bool }` with the
//! status chosen by [`crate::error::AppError`]. `reauth` tells the client to
//! send the user through sign-in again.
//!
//! ### Monitoring
//!
//! - [`health`] - status and version
//! - [`dashboard_health`] - the same plus the load of the request queue

mod callback;
pub mod dashboard;
mod health;

pub use callback::{AuthState, PendingAuth, callback};
pub use dashboard::AppState;
pub use health::{Health, QueueLoad, dashboard_health, health};
