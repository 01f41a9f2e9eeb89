use crate::{api::AppState, error, info, server};

use super::Context;

/// Runs the JSON dashboard until the process is stopped.
pub async fn serve(ctx: &Context) {
    let state = AppState::new(
        ctx.client.clone(),
        ctx.oauth.clone(),
        ctx.config.session_secret.clone(),
    );

    info!(
        "Dashboard API listening on http://{}",
        ctx.config.server_address
    );
    if let Err(e) = server::serve(&ctx.config.server_address, server::dashboard_router(state)).await
    {
        error!("{}", e);
    }
}
