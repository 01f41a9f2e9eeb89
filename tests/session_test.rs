use std::path::PathBuf;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use chrono::Utc;
use serde_json::{Value, json};
use spotstats::{
    config::Config,
    error::AppError,
    management::SessionManager,
    retry::RetryPolicy,
    spotify::OAuthClient,
    types::{Session, SessionErrorTag, TokenResponse},
    utils,
};

const SECRET: &str = "a-session-secret-for-tests";

fn temp_session_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("spotstats-test-{}", utils::generate_state()))
        .join("session.json")
}

fn token(access_token: &str, refresh_token: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        token_type: Some("Bearer".to_string()),
        expires_in: 3600,
        refresh_token: refresh_token.map(str::to_string),
        scope: None,
    }
}

fn session(expires_at: i64) -> Session {
    Session {
        access_token: "old-access".to_string(),
        refresh_token: "old-refresh".to_string(),
        expires_at,
        error: None,
    }
}

fn config(token_url: String) -> Config {
    Config {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        session_secret: SECRET.to_string(),
        callback_base_url: "http://127.0.0.1:8888".to_string(),
        server_address: "127.0.0.1:8888".to_string(),
        api_url: "http://127.0.0.1:1".to_string(),
        auth_url: "https://accounts.spotify.com/authorize".to_string(),
        token_url,
        scope: "user-top-read".to_string(),
        force_synthetic_features: false,
        request_concurrency: 3,
        retry: RetryPolicy::default(),
    }
}

/// Serves a token endpoint that answers every grant with `body`, provided the
/// request carries the expected basic-auth header.
async fn token_endpoint(status: StatusCode, body: Value) -> String {
    let expected = utils::basic_auth_header("client-id", "client-secret");
    let app = Router::new().route(
        "/api/token",
        post(move |headers: HeaderMap| async move {
            let authorized = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == expected);
            if authorized {
                (status, Json(body))
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "invalid_client" })),
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    format!("http://{}/api/token", addr)
}

#[test]
fn test_from_token_response() {
    let session = Session::from_token_response(token("access", Some("refresh")), 1_000);

    assert_eq!(session.access_token, "access");
    assert_eq!(session.refresh_token, "refresh");
    assert_eq!(session.expires_at, 4_600);
    assert_eq!(session.error, None);
}

#[test]
fn test_is_expired() {
    let session = session(1_000);

    assert!(!session.is_expired(999));
    assert!(session.is_expired(1_000));
    assert!(session.is_expired(1_001));
}

#[test]
fn test_refresh_keeps_previous_refresh_token() {
    let mut session = session(0);
    session.apply_refresh(token("new-access", None), 100);

    assert_eq!(session.access_token, "new-access");
    assert_eq!(session.refresh_token, "old-refresh");
    assert_eq!(session.expires_at, 3_700);

    session.apply_refresh(token("newer-access", Some("")), 200);
    assert_eq!(session.refresh_token, "old-refresh");
}

#[test]
fn test_refresh_rotates_refresh_token() {
    let mut session = session(0);
    session.error = Some(SessionErrorTag::RefreshAccessTokenError);
    session.apply_refresh(token("new-access", Some("new-refresh")), 100);

    assert_eq!(session.refresh_token, "new-refresh");
    assert_eq!(session.error, None);
}

#[tokio::test]
async fn test_persist_and_load() {
    let path = temp_session_path();
    let manager = SessionManager::with_path(session(42), SECRET, path.clone());
    manager.persist().await.unwrap();

    let loaded = SessionManager::load_from(SECRET, path.clone()).await.unwrap();
    assert_eq!(loaded.session(), &session(42));

    let wrong_secret = SessionManager::load_from("another-secret-value", path).await;
    assert!(matches!(wrong_secret, Err(AppError::Session(_))));
}

#[tokio::test]
async fn test_load_rejects_tampered_session() {
    let path = temp_session_path();
    SessionManager::with_path(session(42), SECRET, path.clone())
        .persist()
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replace("old-access", "forged-access")).unwrap();

    let result = SessionManager::load_from(SECRET, path).await;
    assert!(matches!(result, Err(AppError::Session(_))));
}

#[tokio::test]
async fn test_load_missing_session() {
    let result = SessionManager::load_from(SECRET, temp_session_path()).await;
    assert!(matches!(result, Err(AppError::NotSignedIn)));
}

#[tokio::test]
async fn test_valid_token_is_reused() {
    // nothing listens on port 1, any refresh attempt would fail
    let oauth = OAuthClient::from_config(&config("http://127.0.0.1:1/api/token".to_string()));
    let expires_at = Utc::now().timestamp() + 600;
    let mut manager = SessionManager::with_path(session(expires_at), SECRET, temp_session_path());

    assert_eq!(manager.access_token(&oauth).await.unwrap(), "old-access");
    assert_eq!(manager.session().expires_at, expires_at);
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let url = token_endpoint(
        StatusCode::OK,
        json!({
            "access_token": "new-access",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-top-read"
        }),
    )
    .await;
    let oauth = OAuthClient::from_config(&config(url));
    let path = temp_session_path();
    let mut manager = SessionManager::with_path(
        session(Utc::now().timestamp() - 10),
        SECRET,
        path.clone(),
    );

    let before = Utc::now().timestamp();
    let access_token = manager.access_token(&oauth).await.unwrap();

    assert_eq!(access_token, "new-access");
    assert_eq!(manager.session().refresh_token, "old-refresh");
    assert!(manager.session().expires_at >= before + 3600);

    let reloaded = SessionManager::load_from(SECRET, path).await.unwrap();
    assert_eq!(reloaded.session(), manager.session());
}

#[tokio::test]
async fn test_failed_refresh_requires_reauth() {
    let url = token_endpoint(
        StatusCode::BAD_REQUEST,
        json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        }),
    )
    .await;
    let oauth = OAuthClient::from_config(&config(url));
    let mut manager = SessionManager::with_path(
        session(Utc::now().timestamp() - 10),
        SECRET,
        temp_session_path(),
    );

    let result = manager.access_token(&oauth).await;
    assert!(matches!(result, Err(AppError::ReauthRequired)));
    assert_eq!(
        manager.session().error,
        Some(SessionErrorTag::RefreshAccessTokenError)
    );

    let again = manager.access_token(&oauth).await;
    assert!(matches!(again, Err(AppError::ReauthRequired)));
}
