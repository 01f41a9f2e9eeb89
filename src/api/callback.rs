use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{spotify::OAuthClient, types::Session, warning};

/// Sign-in in progress: the `state` sent to Spotify and, once the callback
/// arrived, the resulting session.
#[derive(Debug, Clone)]
pub struct PendingAuth {
    pub state: String,
    pub session: Option<Session>,
}

/// Shared between the `auth` command and the callback handler.
#[derive(Clone)]
pub struct AuthState {
    pub oauth: OAuthClient,
    pub pending: Arc<Mutex<Option<PendingAuth>>>,
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(auth): Extension<AuthState>,
) -> Html<&'static str> {
    if let Some(error) = params.get("error") {
        warning!("Spotify denied the authorization: {}", error);
        return Html("<h4>Authorization denied.</h4>");
    }

    let Some(code) = params.get("code") else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    let mut guard = auth.pending.lock().await;
    let Some(pending) = guard.as_mut() else {
        return Html("<h4>No sign-in in progress.</h4>");
    };

    if params.get("state") != Some(&pending.state) {
        warning!("Callback state does not match the sign-in request");
        return Html("<h4>State mismatch. Please start the sign-in again.</h4>");
    }

    match auth.oauth.exchange_code(code).await {
        Ok(token) => {
            pending.session = Some(Session::from_token_response(token, Utc::now().timestamp()));
            Html("<h2>Authentication successful.</h2><p>You can close this browser window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    }
}
