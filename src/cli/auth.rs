use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    api::{AuthState, PendingAuth},
    error, info,
    management::SessionManager,
    server, success,
    types::Session,
    utils, warning,
};

use super::Context;

const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(120);

/// Signs in with Spotify and stores the session.
///
/// Starts the callback server, opens the authorization URL in the browser and
/// waits until the callback delivered a session or the timeout hit.
pub async fn auth(ctx: &Context) {
    let state = utils::generate_state();
    let pending = Arc::new(Mutex::new(Some(PendingAuth {
        state: state.clone(),
        session: None,
    })));

    let router = server::auth_router(AuthState {
        oauth: ctx.oauth.clone(),
        pending: Arc::clone(&pending),
    });
    let addr = ctx.config.server_address.clone();
    tokio::spawn(async move {
        if let Err(e) = server::serve(&addr, router).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = match ctx.oauth.authorize_url(&state) {
        Ok(url) => url,
        Err(e) => error!("{}", e),
    };

    info!("Waiting for Spotify to redirect to {}", ctx.config.redirect_uri());
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    match wait_for_session(pending).await {
        Some(session) => {
            let manager = SessionManager::new(session, ctx.config.session_secret.clone());
            if let Err(e) = manager.persist().await {
                error!("Failed to save session: {}", e);
            }
            success!("Authentication successful!");
        }
        None => error!("Authentication failed or timed out."),
    }
}

async fn wait_for_session(pending: Arc<Mutex<Option<PendingAuth>>>) -> Option<Session> {
    let start = tokio::time::Instant::now();

    while start.elapsed() < SIGN_IN_TIMEOUT {
        if let Some(session) = pending
            .lock()
            .await
            .as_ref()
            .and_then(|p| p.session.clone())
        {
            return Some(session);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Loads the stored session and returns a usable access token, or exits.
pub(super) async fn access_token(ctx: &Context) -> String {
    let mut manager = match SessionManager::load(&ctx.config.session_secret).await {
        Ok(m) => m,
        Err(e) => error!("{}", e),
    };

    match manager.access_token(&ctx.oauth).await {
        Ok(token) => token,
        Err(e) => error!("{}", e),
    }
}
