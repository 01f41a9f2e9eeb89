use std::time::Duration;

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use hmac::{Hmac, Mac, digest::InvalidLength};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// `Basic base64(client_id:client_secret)` for the token endpoint.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let credentials = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", STANDARD.encode(credentials))
}

/// HMAC-SHA256 of `message` under `key`.
///
/// # Arguments
///
/// * `key` - Secret key of any length
/// * `message` - Bytes to authenticate
///
/// # Returns
///
/// The 32 byte tag, or `InvalidLength` if the MAC rejects the key.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// URL-safe, unpadded base64 signature of `payload` under `secret`.
///
/// # Example
///
/// ```
/// let signature = sign("session-secret-value", b"{}")?;
/// assert!(verify_signature("session-secret-value", b"{}", &signature));
/// ```
pub fn sign(secret: &str, payload: &[u8]) -> Result<String, InvalidLength> {
    Ok(URL_SAFE_NO_PAD.encode(hmac_sha256(secret.as_bytes(), payload)?))
}

/// Checks a signature produced by [`sign`].
///
/// The comparison is constant-time (`Mac::verify_slice`). Signatures that are
/// not valid base64 never verify.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(tag) = URL_SAFE_NO_PAD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&tag).is_ok()
}

/// Spotify ids are 22 base-62 characters.
pub fn is_valid_spotify_id(id: &str) -> bool {
    id.len() == 22 && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Spinner shown while a command waits on Spotify.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Formats a score for display, `n/a` when it could not be computed.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.0}/100", s.round()),
        None => "n/a".to_string(),
    }
}

/// Percentage share of `count` in `total`, one decimal.
pub fn format_share(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}
