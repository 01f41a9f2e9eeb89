//! Spotify Listening Statistics Library
//!
//! This library fetches a user's listening history and playlists from the
//! Spotify Web API and derives statistics from them: an obscurity score from
//! track popularity, a mood score from audio features, genre diversity and
//! genre/era breakdowns. It also produces recommendation lists through a
//! fallback cascade that keeps working when the recommendations endpoint is
//! restricted.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the sign-in callback and the JSON dashboard
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration loaded from environment variables and `.env` files
//! - `error` - Error types for remote API and application failures
//! - `management` - Session lifecycle, dashboard aggregation and recommendations
//! - `metrics` - Pure score functions and breakdowns
//! - `queue` - Bounded concurrency queue for outbound requests
//! - `retry` - Retry wrapper with exponential backoff
//! - `server` - Local HTTP servers (sign-in callback and dashboard)
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod metrics;
pub mod queue;
pub mod retry;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching top tracks...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used for failures where continuing makes no sense, such as missing
/// configuration at start-up. Everything that talks to Spotify degrades to a
/// [`warning!`] instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues: retries, skipped recommendation attempts,
/// synthetic data standing in for restricted endpoints.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
