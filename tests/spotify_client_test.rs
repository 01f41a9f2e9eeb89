use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode, header::HOST, header::RETRY_AFTER},
    response::IntoResponse,
    routing::get,
};
use serde_json::{Value, json};
use spotstats::{
    error::ApiError,
    management::{RecommendationContext, recommend, recommendations::StrategyKind},
    queue::RequestQueue,
    retry::RetryPolicy,
    spotify::{self, SpotifyClient, recommendations::AuthorizedClient, tracks::batch_ids},
    types::TimeRange,
};

const TOKEN: &str = "test-token";

type Params = Query<HashMap<String, String>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}", addr)
}

fn client(base: String) -> SpotifyClient {
    SpotifyClient::new(
        base,
        RequestQueue::new(3),
        RetryPolicy {
            initial_delay: Duration::from_millis(10),
            ..RetryPolicy::default()
        },
    )
}

fn track_json(id: Value, name: &str, popularity: u8) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{ "id": "artist1", "name": "Some Artist" }],
        "album": {
            "id": "album1",
            "name": "Some Album",
            "images": [{ "url": "https://i.scdn.co/image/abc", "width": 640, "height": 640 }],
            "release_date": "1994-10-01"
        },
        "external_urls": { "spotify": "https://open.spotify.com/track/x" },
        "popularity": popularity,
        "uri": "spotify:track:x"
    })
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{:0>22}", i)).collect()
}

#[tokio::test]
async fn test_audio_features_are_batched() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let recorded = batches.clone();
    let app = Router::new().route(
        "/audio-features",
        get(move |Query(params): Params| {
            let recorded = recorded.clone();
            async move {
                let ids: Vec<&str> = params
                    .get("ids")
                    .map(|s| s.split(',').collect())
                    .unwrap_or_default();
                recorded.lock().unwrap().push(ids.len());

                let features: Vec<Value> = ids
                    .iter()
                    .map(|id| {
                        json!({
                            "id": id,
                            "danceability": 0.1,
                            "energy": 0.9,
                            "valence": 0.3,
                            "acousticness": 0.2,
                            "instrumentalness": 0.0,
                            "tempo": 128.0
                        })
                    })
                    .collect();
                Json(json!({ "audio_features": features }))
            }
        }),
    );
    let client = client(serve(app).await);

    let set = client.audio_features(TOKEN, &ids(250)).await.unwrap();

    assert!(!set.synthetic);
    assert_eq!(set.features.len(), 250);
    assert_eq!(*batches.lock().unwrap(), vec![100, 100, 50]);
}

#[tokio::test]
async fn test_audio_features_forbidden_uses_synthetic_values() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new().route(
        "/audio-features",
        get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": { "status": 403, "message": "Forbidden" } })),
                )
            }
        }),
    );
    let client = client(serve(app).await);

    let set = client.audio_features(TOKEN, &ids(3)).await.unwrap();

    assert!(set.synthetic);
    assert_eq!(set.features.len(), 3);
    assert!(set.features.iter().all(|f| f.valence == 0.5 && f.energy == 0.5));
    // 403 is never retried
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forced_synthetic_features_skip_the_endpoint() {
    // nothing listens here
    let client = client("http://127.0.0.1:1".to_string()).with_synthetic_features(true);

    let set = client.audio_features(TOKEN, &ids(2)).await.unwrap();

    assert!(set.synthetic);
    assert_eq!(set.features[1].id, ids(2)[1]);
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new().route(
        "/me/top/tracks",
        get(move |Query(params): Params| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    return (
                        StatusCode::TOO_MANY_REQUESTS,
                        [(RETRY_AFTER, "0")],
                        Json(json!({ "error": { "status": 429, "message": "API rate limit exceeded" } })),
                    )
                        .into_response();
                }

                assert_eq!(params.get("time_range").map(String::as_str), Some("short_term"));
                assert_eq!(params.get("limit").map(String::as_str), Some("50"));
                Json(json!({
                    "items": [track_json(json!("4uLU6hMCjMI75M1A2tKUQC"), "Obscure", 7)],
                    "next": null,
                    "total": 1
                }))
                .into_response()
            }
        }),
    );
    let client = client(serve(app).await);

    let tracks = client
        .top_tracks(TOKEN, TimeRange::ShortTerm, 500)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].popularity, 7);
    assert_eq!(tracks[0].album_art(), Some("https://i.scdn.co/image/abc"));
}

#[tokio::test]
async fn test_retry_wait_does_not_hold_a_queue_slot() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new()
        .route(
            "/me/top/tracks",
            get(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        return (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "2")], "slow down")
                            .into_response();
                    }
                    Json(json!({ "items": [], "next": null, "total": 0 })).into_response()
                }
            }),
        )
        .route(
            "/me",
            get(|| async { Json(json!({ "id": "listener", "display_name": null })) }),
        );
    let base = serve(app).await;
    let client = SpotifyClient::new(base, RequestQueue::new(1), RetryPolicy::default());

    let rate_limited = {
        let client = client.clone();
        tokio::spawn(async move { client.top_tracks(TOKEN, TimeRange::LongTerm, 5).await })
    };
    while calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // the only slot is free while the first request waits out retry-after
    let started = std::time::Instant::now();
    let user = client.current_user(TOKEN).await.unwrap();
    assert_eq!(user.id, "listener");
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert!(!rate_limited.is_finished());

    assert!(rate_limited.await.unwrap().unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unauthorized_fails_fast() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = Router::new().route(
        "/me",
        get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "status": 401, "message": "The access token expired" } })),
                )
            }
        }),
    );
    let client = client(serve(app).await);

    let result = client.current_user(TOKEN).await;

    match result {
        Err(ApiError::Unauthorized(message)) => assert_eq!(message, "The access token expired"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_playlists_follow_next_links() {
    let app = Router::new()
        .route(
            "/me/playlists",
            get(|headers: HeaderMap| async move {
                let host = headers
                    .get(HOST)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "items": [{
                        "id": "p1",
                        "name": "First",
                        "description": null,
                        "owner": { "id": "me", "display_name": "Me" },
                        "tracks": { "total": 12 },
                        "images": null
                    }],
                    "next": format!("http://{}/me/playlists/page-2", host),
                    "total": 2
                }))
            }),
        )
        .route(
            "/me/playlists/page-2",
            get(|| async {
                Json(json!({
                    "items": [{
                        "id": "p2",
                        "name": "Second",
                        "owner": { "id": "me", "display_name": null },
                        "images": [{ "url": "https://i.scdn.co/image/p2", "width": null, "height": null }]
                    }],
                    "next": null,
                    "total": 2
                }))
            }),
        );
    let client = client(serve(app).await);

    let playlists = client.playlists(TOKEN).await.unwrap();

    assert_eq!(
        playlists.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["p1", "p2"]
    );
    assert_eq!(playlists[0].art(), None);
    assert_eq!(playlists[0].tracks.total, 12);
    assert_eq!(playlists[1].art(), Some("https://i.scdn.co/image/p2"));
}

#[tokio::test]
async fn test_playlist_tracks_skip_local_and_removed_tracks() {
    let app = Router::new().route(
        "/playlists/{id}/tracks",
        get(|| async {
            Json(json!({
                "items": [
                    { "track": track_json(json!("4uLU6hMCjMI75M1A2tKUQC"), "Kept", 40) },
                    { "track": null },
                    { "track": track_json(Value::Null, "Local file", 0) }
                ],
                "next": null,
                "total": 3
            }))
        }),
    );
    let client = client(serve(app).await);

    let tracks = client.playlist_tracks(TOKEN, "p1").await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].name, "Kept");
}

#[tokio::test]
async fn test_recommend_against_client() {
    let app = Router::new()
        .route(
            "/recommendations/available-genre-seeds",
            get(|| async { Json(json!({ "genres": ["acoustic", "pop", "rock"] })) }),
        )
        .route(
            "/recommendations",
            get(|Query(params): Params| async move {
                let genres = params.get("seed_genres").map(String::as_str);
                let popularity = params.get("target_popularity").map(String::as_str);
                if genres == Some("pop,rock") && popularity == Some("20") {
                    Json(json!({ "tracks": [track_json(json!("4uLU6hMCjMI75M1A2tKUQC"), "Deep", 18)] }))
                        .into_response()
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
                }
            }),
        );
    let client = client(serve(app).await);
    let source = AuthorizedClient {
        client: &client,
        token: TOKEN,
    };

    let result = recommend(&source, &RecommendationContext::new(80, 10, Vec::new())).await;

    assert_eq!(result.strategy, StrategyKind::GenreSeeds);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.tracks[0].name, "Deep");
}

#[test]
fn test_parse_retry_after() {
    assert_eq!(spotify::parse_retry_after("2"), Some(Duration::from_secs(2)));
    assert_eq!(
        spotify::parse_retry_after(" 1.5 "),
        Some(Duration::from_millis(1500))
    );
    assert_eq!(spotify::parse_retry_after("-1"), None);
    assert_eq!(spotify::parse_retry_after("soon"), None);
}

#[test]
fn test_error_message() {
    assert_eq!(
        spotify::error_message(r#"{"error":{"status":401,"message":"The access token expired"}}"#),
        "The access token expired"
    );
    assert_eq!(
        spotify::error_message(r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#),
        "Invalid refresh token"
    );
    assert_eq!(spotify::error_message(" Bad Gateway "), "Bad Gateway");
}

#[test]
fn test_batch_ids() {
    let batches = batch_ids(&ids(5), 2);

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[2], ids(5)[4]);
    assert_eq!(batches[0], format!("{},{}", ids(5)[0], ids(5)[1]));
    assert!(batch_ids(&[], 100).is_empty());
}
