use tabled::Table;

use crate::{info, types::PlaylistTableRow, utils, warning};

use super::{Context, auth::access_token, top::track_table};

/// Lists the user's playlists, or the tracks of one playlist.
pub async fn playlists(ctx: &Context, id: Option<String>) {
    let token = access_token(ctx).await;

    if let Some(id) = id {
        let pb = utils::spinner("Fetching playlist tracks...");
        let result = ctx.client.playlist_tracks(&token, &id).await;
        pb.finish_and_clear();

        match result {
            Ok(tracks) if tracks.is_empty() => info!("Playlist {} has no tracks.", id),
            Ok(tracks) => println!("{}", track_table(&tracks)),
            Err(e) => warning!("Failed to load playlist {}: {}", id, e),
        }
        return;
    }

    let pb = utils::spinner("Fetching playlists...");
    let result = ctx.client.playlists(&token).await;
    pb.finish_and_clear();

    match result {
        Ok(playlists) => {
            let rows: Vec<PlaylistTableRow> = playlists
                .into_iter()
                .map(|p| PlaylistTableRow {
                    id: p.id,
                    name: p.name,
                    owner: p.owner.display_name.unwrap_or(p.owner.id),
                    tracks: p.tracks.total,
                })
                .collect();
            info!("{} playlists", rows.len());
            println!("{}", Table::new(rows));
        }
        Err(e) => warning!("Failed to load playlists: {}", e),
    }
}
