use spotstats::{
    config::{Config, DEFAULT_API_URL, parse_flag},
    retry::RetryPolicy,
    types::TimeRange,
};

#[test]
fn test_parse_flag() {
    for value in ["1", "true", "TRUE", " yes ", "on"] {
        assert!(parse_flag(value), "{} should be true", value);
    }
    for value in ["0", "false", "off", "", "maybe"] {
        assert!(!parse_flag(value), "{} should be false", value);
    }
}

#[test]
fn test_redirect_uri() {
    let config = Config {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        session_secret: "0123456789abcdef".to_string(),
        callback_base_url: "http://127.0.0.1:8888".to_string(),
        server_address: "127.0.0.1:8888".to_string(),
        api_url: DEFAULT_API_URL.to_string(),
        auth_url: "https://accounts.spotify.com/authorize".to_string(),
        token_url: "https://accounts.spotify.com/api/token".to_string(),
        scope: "user-top-read".to_string(),
        force_synthetic_features: false,
        request_concurrency: 3,
        retry: RetryPolicy::default(),
    };

    assert_eq!(config.redirect_uri(), "http://127.0.0.1:8888/callback");
}

#[test]
fn test_time_range_names() {
    assert_eq!(TimeRange::default(), TimeRange::MediumTerm);
    assert_eq!(TimeRange::ShortTerm.to_string(), "short_term");

    let parsed: TimeRange = serde_json::from_str("\"long_term\"").unwrap();
    assert_eq!(parsed, TimeRange::LongTerm);
    let alias: TimeRange = serde_json::from_str("\"short\"").unwrap();
    assert_eq!(alias, TimeRange::ShortTerm);
}
