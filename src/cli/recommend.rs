use crate::{
    info,
    management::{
        RecommendationContext, recommend as cascade, recommendations::MAX_TRACK_SEEDS,
    },
    spotify::recommendations::AuthorizedClient,
    success,
    types::TimeRange,
    utils, warning,
};

use super::{Context, auth::access_token, top::track_table};

pub async fn recommend(ctx: &Context, obscurity: u8, limit: u32) {
    let token = access_token(ctx).await;

    let pb = utils::spinner("Finding recommendations...");
    let seeds = match ctx
        .client
        .top_tracks(&token, TimeRange::MediumTerm, MAX_TRACK_SEEDS as u32)
        .await
    {
        Ok(tracks) => tracks.into_iter().map(|t| t.id).collect(),
        Err(e) => {
            warning!("Failed to load top tracks for seeding: {}", e);
            Vec::new()
        }
    };

    let context = RecommendationContext::new(obscurity, limit, seeds);
    let source = AuthorizedClient {
        client: &ctx.client,
        token: &token,
    };
    let result = cascade(&source, &context).await;
    pb.finish_and_clear();

    if result.fallback {
        warning!(
            "Spotify did not return recommendations after {} attempts; these are placeholders.",
            result.attempts
        );
    } else {
        success!(
            "{} recommendations (target popularity {})",
            result.tracks.len(),
            context.target_popularity()
        );
        if let Some(seeds) = &result.seeds {
            info!("Seeded by {:?}", seeds);
        }
    }
    println!("{}", track_table(&result.tracks));
}
