use tabled::Table;

use crate::{
    info,
    management::dashboard,
    metrics::BreakdownEntry,
    success,
    types::{BreakdownTableRow, TimeRange},
    utils, warning,
};

use super::{Context, auth::access_token};

pub async fn stats(ctx: &Context, time_range: TimeRange) {
    let token = access_token(ctx).await;

    let pb = utils::spinner("Crunching your listening history...");
    let result = dashboard::build_stats(&ctx.client, &token, time_range).await;
    pb.finish_and_clear();

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            warning!("Failed to load statistics: {}", e);
            return;
        }
    };

    success!("Statistics for {} ({} tracks)", time_range, stats.track_count);
    info!("Obscurity: {}", utils::format_score(stats.obscurity));
    info!("Mood:      {}", utils::format_score(stats.mood));
    info!(
        "Diversity: {} ({} genres)",
        utils::format_score(Some(stats.diversity)),
        stats.unique_genres
    );
    if let Some(track) = &stats.most_obscure {
        info!(
            "Most obscure pick: {} by {} (popularity {})",
            track.name,
            track.artist_names(),
            track.popularity
        );
    }

    if !stats.genres.is_empty() {
        println!("{}", breakdown_table(&stats.genres));
    }
    if !stats.eras.is_empty() {
        println!("{}", breakdown_table(&stats.eras));
    }

    for notice in &stats.notices {
        warning!("{}", notice);
    }
}

fn breakdown_table(entries: &[BreakdownEntry]) -> Table {
    let total: usize = entries.iter().map(|e| e.count).sum();
    let rows: Vec<BreakdownTableRow> = entries
        .iter()
        .map(|e| BreakdownTableRow {
            label: e.label.clone(),
            count: e.count,
            share: utils::format_share(e.count, total),
        })
        .collect();
    Table::new(rows)
}
