use crate::{info, success, warning};

use super::{Context, auth::access_token};

pub async fn profile(ctx: &Context) {
    let token = access_token(ctx).await;

    match ctx.client.current_user(&token).await {
        Ok(user) => {
            success!(
                "Signed in as {} ({})",
                user.display_name.as_deref().unwrap_or(&user.id),
                user.id
            );
            info!("Country: {}", user.country.as_deref().unwrap_or("unknown"));
            info!("Plan: {}", user.product.as_deref().unwrap_or("unknown"));
            info!("Followers: {}", user.followers.total);
            if let Some(url) = user.external_urls.spotify {
                info!("Profile: {}", url);
            }
        }
        Err(e) => warning!("Failed to load profile: {}", e),
    }
}
