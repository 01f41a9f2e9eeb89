use tabled::Table;

use crate::{
    info, metrics,
    types::{TimeRange, Track, TrackTableRow},
    utils, warning,
};

use super::{Context, auth::access_token};

pub async fn top(ctx: &Context, time_range: TimeRange, limit: u32) {
    let token = access_token(ctx).await;

    let pb = utils::spinner("Fetching top tracks...");
    let result = ctx.client.top_tracks(&token, time_range, limit).await;
    pb.finish_and_clear();

    match result {
        Ok(tracks) if tracks.is_empty() => info!("No top tracks for {} yet.", time_range),
        Ok(tracks) => println!("{}", track_table(&tracks)),
        Err(e) => warning!("Failed to load top tracks: {}", e),
    }
}

/// Ranked table of tracks with their obscurity.
pub fn track_table(tracks: &[Track]) -> Table {
    let rows: Vec<TrackTableRow> = tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            rank: i + 1,
            name: t.name.clone(),
            artists: t.artist_names(),
            popularity: t.popularity,
            obscurity: format!("{:.0}", metrics::obscurity(t.popularity as f64)),
        })
        .collect();
    Table::new(rows)
}
