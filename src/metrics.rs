//! Derived listening metrics.
//!
//! Every score is clamped to `[0, 100]`; NaN inputs score 0.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::types::{AudioFeatures, Track};

/// Unique genre count that maps to a diversity of 100.
pub const DIVERSITY_GENRE_CEILING: f64 = 20.0;

const GENRE_CATEGORIES: &[(&str, &[&str])] = &[
    ("Pop", &["pop", "k-pop", "synth"]),
    ("Rock", &["rock", "grunge", "shoegaze"]),
    ("Hip-Hop", &["hip hop", "rap", "trap", "drill"]),
    ("Electronic", &["electronic", "edm", "house", "techno", "dubstep", "trance"]),
    ("R&B / Soul", &["r&b", "soul", "funk", "motown"]),
    ("Jazz / Blues", &["jazz", "blues", "swing", "bebop"]),
    ("Classical", &["classical", "orchestra", "baroque", "opera", "compositional"]),
    ("Metal / Punk", &["metal", "punk", "hardcore", "emo"]),
    ("Folk / Country", &["folk", "country", "americana", "bluegrass", "singer-songwriter"]),
    ("Latin", &["latin", "reggaeton", "salsa", "bossa", "cumbia"]),
    ("Indie / Alternative", &["indie", "alternative", "lo-fi", "bedroom"]),
];

pub const OTHER_CATEGORY: &str = "Other";

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Obscurity score of a single popularity value.
///
/// # Arguments
///
/// * `popularity` - Spotify popularity, 0 to 100
///
/// # Returns
///
/// `100 - popularity`, clamped to `0..=100`.
///
/// # Example
///
/// ```
/// assert_eq!(obscurity(72.0), 28.0);
/// assert_eq!(obscurity(140.0), 0.0);
/// ```
pub fn obscurity(popularity: f64) -> f64 {
    clamp_score(100.0 - popularity)
}

/// Mean of valence and energy as a percentage.
///
/// # Arguments
///
/// * `valence` - Musical positiveness, 0.0 to 1.0
/// * `energy` - Perceived intensity, 0.0 to 1.0
///
/// # Example
///
/// ```
/// assert_eq!(mood(0.5, 0.7), 60.0);
/// ```
pub fn mood(valence: f64, energy: f64) -> f64 {
    clamp_score((valence + energy) / 2.0 * 100.0)
}

/// Diversity score from the number of distinct genres.
///
/// [`DIVERSITY_GENRE_CEILING`] genres or more give 100.
///
/// # Example
///
/// ```
/// assert_eq!(diversity(5), 25.0);
/// assert_eq!(diversity(35), 100.0);
/// ```
pub fn diversity(unique_genre_count: usize) -> f64 {
    clamp_score(unique_genre_count as f64 / DIVERSITY_GENRE_CEILING * 100.0)
}

/// Average obscurity of a track list, `None` when the list is empty.
pub fn average_obscurity(tracks: &[Track]) -> Option<f64> {
    if tracks.is_empty() {
        return None;
    }
    let total: f64 = tracks.iter().map(|t| obscurity(t.popularity as f64)).sum();
    Some(clamp_score(total / tracks.len() as f64))
}

/// Mood of the averaged valence and energy, `None` without features.
pub fn average_mood(features: &[AudioFeatures]) -> Option<f64> {
    if features.is_empty() {
        return None;
    }
    let n = features.len() as f64;
    let valence = features.iter().map(|f| f.valence).sum::<f64>() / n;
    let energy = features.iter().map(|f| f.energy).sum::<f64>() / n;
    Some(mood(valence, energy))
}

/// Distinct genres, compared case-insensitively.
pub fn unique_genres<'a, I>(genres: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    genres
        .into_iter()
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub count: usize,
}

/// Categories a genre falls into.
///
/// A genre matches a category when either string contains one of the
/// category keywords. A genre can land in several categories; genres matching
/// none are reported as [`OTHER_CATEGORY`].
pub fn categorize_genre(genre: &str) -> Vec<&'static str> {
    let genre = genre.trim().to_lowercase();
    if genre.is_empty() {
        return vec![OTHER_CATEGORY];
    }

    let matched: Vec<&'static str> = GENRE_CATEGORIES
        .iter()
        .filter(|(_, keywords)| {
            keywords
                .iter()
                .any(|kw| genre.contains(kw) || kw.contains(genre.as_str()))
        })
        .map(|(category, _)| *category)
        .collect();

    if matched.is_empty() {
        vec![OTHER_CATEGORY]
    } else {
        matched
    }
}

/// Counts genres per category, largest first.
pub fn genre_breakdown<'a, I>(genres: I) -> Vec<BreakdownEntry>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for genre in genres {
        for category in categorize_genre(genre) {
            *counts.entry(category).or_default() += 1;
        }
    }
    sorted_breakdown(counts.into_iter().map(|(k, v)| (k.to_string(), v)))
}

/// Decade label of a Spotify release date (`1997`, `1997-05`, `1997-05-21`).
///
/// # Returns
///
/// - `Some("1990s")` for any of the three precisions above
/// - `None` when the date does not start with a positive year
pub fn release_decade(release_date: &str) -> Option<String> {
    let year: i32 = release_date.get(0..4)?.parse().ok()?;
    if year <= 0 {
        return None;
    }
    Some(format!("{}s", year - year % 10))
}

/// Counts tracks per release decade, largest first.
pub fn era_breakdown(tracks: &[Track]) -> Vec<BreakdownEntry> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for track in tracks {
        let label = release_decade(&track.album.release_date)
            .unwrap_or_else(|| "Unknown".to_string());
        *counts.entry(label).or_default() += 1;
    }
    sorted_breakdown(counts.into_iter())
}

fn sorted_breakdown(counts: impl Iterator<Item = (String, usize)>) -> Vec<BreakdownEntry> {
    let mut entries: Vec<BreakdownEntry> = counts
        .map(|(label, count)| BreakdownEntry { label, count })
        .collect();
    // stable sort keeps the alphabetical order for ties
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}
