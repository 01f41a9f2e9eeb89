use std::{net::SocketAddr, str::FromStr};

use axum::{Extension, Router, routing::get};

use crate::api::{self, AppState, AuthState, dashboard};

/// Routes of the temporary sign-in server.
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)))
}

/// Routes of the JSON dashboard.
pub fn dashboard_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::dashboard_health))
        .route("/api/me", get(dashboard::me))
        .route("/api/top-tracks", get(dashboard::top_tracks))
        .route("/api/playlists", get(dashboard::playlists))
        .route("/api/playlists/{id}/tracks", get(dashboard::playlist_tracks))
        .route("/api/stats", get(dashboard::stats))
        .route("/api/recommendations", get(dashboard::recommendations))
        .with_state(state)
}

/// Binds `addr` and serves `app` until the process ends.
pub async fn serve(addr: &str, app: Router) -> Result<(), String> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| format!("Failed to parse server address '{}': {}", addr, e))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}
