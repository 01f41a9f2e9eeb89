use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotstats::{
    cli::{self, Context},
    config::{self, Config},
    error,
    management::recommendations::{DEFAULT_LIMIT, MAX_LIMIT},
    spotify::tracks::MAX_TOP_LIMIT,
    types::TimeRange,
    warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with Spotify
    Auth,

    /// Show the signed-in user
    Profile,

    /// Top tracks with their obscurity
    Top(TopOptions),

    /// List playlists or the tracks of one playlist
    Playlists(PlaylistsOptions),

    /// Obscurity, mood and diversity scores with genre and era breakdowns
    Stats(StatsOptions),

    /// Recommendations tuned by obscurity
    Recommend(RecommendOptions),

    /// Serve the JSON dashboard API
    Serve,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TopOptions {
    /// Listening window
    #[clap(long, value_enum, default_value_t = TimeRange::MediumTerm)]
    pub time_range: TimeRange,

    /// Number of tracks
    #[clap(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=MAX_TOP_LIMIT as i64))]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistsOptions {
    /// Show the tracks of this playlist
    #[clap(long)]
    pub id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct StatsOptions {
    /// Listening window
    #[clap(long, value_enum, default_value_t = TimeRange::MediumTerm)]
    pub time_range: TimeRange,
}

#[derive(Parser, Debug, Clone)]
pub struct RecommendOptions {
    /// 0 = mainstream hits, 100 = deep cuts
    #[clap(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub obscurity: u8,

    /// Number of recommendations
    #[clap(long, default_value_t = DEFAULT_LIMIT, value_parser = clap::value_parser!(u32).range(1..=MAX_LIMIT as i64))]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load .env file. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("{}", e),
    };
    let ctx = Context::new(config);

    match cli.command {
        Command::Auth => cli::auth(&ctx).await,
        Command::Profile => cli::profile(&ctx).await,
        Command::Top(opt) => cli::top(&ctx, opt.time_range, opt.limit).await,
        Command::Playlists(opt) => cli::playlists(&ctx, opt.id).await,
        Command::Stats(opt) => cli::stats(&ctx, opt.time_range).await,
        Command::Recommend(opt) => cli::recommend(&ctx, opt.obscurity, opt.limit).await,
        Command::Serve => cli::serve(&ctx).await,
        Command::Completions(_) => {}
    }
}
