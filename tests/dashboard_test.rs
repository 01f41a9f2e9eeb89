use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::json;
use spotstats::{
    management::dashboard::{build_stats, compute_stats, unique_artist_ids},
    queue::RequestQueue,
    retry::RetryPolicy,
    spotify::SpotifyClient,
    types::{AlbumRef, Artist, ArtistRef, AudioFeatures, FeatureSet, TimeRange, Track},
};

fn track(id: &str, popularity: u8, artist_ids: &[&str], release_date: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {}", id),
        popularity,
        artists: artist_ids
            .iter()
            .map(|a| ArtistRef {
                id: a.to_string(),
                name: a.to_uppercase(),
            })
            .collect(),
        album: AlbumRef {
            release_date: release_date.to_string(),
            ..AlbumRef::default()
        },
        ..Track::default()
    }
}

fn artist(id: &str, genres: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: id.to_uppercase(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        ..Artist::default()
    }
}

#[test]
fn test_unique_artist_ids() {
    let tracks = vec![
        track("t1", 10, &["a", "b"], "2001"),
        track("t2", 20, &["b", "", "c"], "2001"),
    ];

    assert_eq!(unique_artist_ids(&tracks), vec!["a", "b", "c"]);
}

#[test]
fn test_compute_stats() {
    let tracks = vec![
        track("t1", 90, &["a"], "1991-01-01"),
        track("t2", 30, &["b"], "2015"),
        track("t3", 60, &["a"], "2018-03"),
    ];
    let features = FeatureSet {
        features: vec![
            AudioFeatures {
                valence: 0.2,
                energy: 0.6,
                ..AudioFeatures::synthetic("t1")
            },
            AudioFeatures {
                valence: 0.4,
                energy: 0.8,
                ..AudioFeatures::synthetic("t2")
            },
        ],
        synthetic: false,
    };
    let artists = vec![
        artist("a", &["indie rock", "Indie Rock", "shoegaze"]),
        artist("b", &["cool jazz"]),
    ];

    let stats = compute_stats(
        TimeRange::ShortTerm,
        tracks,
        Some(features),
        &artists,
        Vec::new(),
    );

    assert_eq!(stats.track_count, 3);
    assert_eq!(stats.obscurity, Some(40.0));
    assert!((stats.mood.unwrap() - 50.0).abs() < 1e-9);
    assert_eq!(stats.unique_genres, 3);
    assert!((stats.diversity - 15.0).abs() < 1e-9);
    assert_eq!(stats.most_obscure.map(|t| t.id), Some("t2".to_string()));
    assert_eq!(stats.eras[0].label, "2010s");
    assert_eq!(stats.eras[0].count, 2);
    assert_eq!(stats.genres[0].label, "Rock");
    assert!(!stats.synthetic_features);
    assert!(stats.notices.is_empty());
}

#[test]
fn test_compute_stats_without_data() {
    let stats = compute_stats(TimeRange::LongTerm, Vec::new(), None, &[], Vec::new());

    assert_eq!(stats.obscurity, None);
    assert_eq!(stats.mood, None);
    assert_eq!(stats.diversity, 0.0);
    assert_eq!(stats.most_obscure, None);
    assert_eq!(stats.notices, vec!["No top tracks for long_term yet".to_string()]);
}

#[test]
fn test_compute_stats_flags_synthetic_features() {
    let features = FeatureSet {
        features: vec![AudioFeatures::synthetic("t1")],
        synthetic: true,
    };
    let stats = compute_stats(
        TimeRange::MediumTerm,
        vec![track("t1", 50, &[], "")],
        Some(features),
        &[],
        Vec::new(),
    );

    assert!(stats.synthetic_features);
    assert_eq!(stats.mood, Some(50.0));
    assert_eq!(stats.notices.len(), 1);
}

#[tokio::test]
async fn test_build_stats_degrades_gracefully() {
    let top = json!({
        "items": [
            { "id": "4uLU6hMCjMI75M1A2tKUQC", "name": "One", "popularity": 20,
              "artists": [{ "id": "a1", "name": "A" }],
              "album": { "id": "x", "name": "X", "images": [], "release_date": "2004" } },
            { "id": "5uLU6hMCjMI75M1A2tKUQC", "name": "Two", "popularity": 60,
              "artists": [{ "id": "a1", "name": "A" }],
              "album": { "id": "y", "name": "Y", "images": [], "release_date": "1979-02-01" } }
        ],
        "next": null,
        "total": 2
    });
    let app = Router::new()
        .route("/me/top/tracks", get(move || async move { Json(top) }))
        .route(
            "/audio-features",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": { "status": 403, "message": "Forbidden" } })),
                )
            }),
        )
        .route(
            "/artists",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": { "status": 500, "message": "Server error" } })),
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let client = SpotifyClient::new(
        format!("http://{}", addr),
        RequestQueue::new(3),
        RetryPolicy {
            initial_delay: Duration::from_millis(5),
            ..RetryPolicy::default()
        },
    );

    let stats = build_stats(&client, "token", TimeRange::MediumTerm)
        .await
        .unwrap();

    assert_eq!(stats.track_count, 2);
    assert_eq!(stats.obscurity, Some(60.0));
    assert!(stats.synthetic_features);
    assert_eq!(stats.mood, Some(50.0));
    assert_eq!(stats.unique_genres, 0);
    assert!(stats.notices.iter().any(|n| n.starts_with("Genre statistics")));
}
