use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    config,
    error::AppError,
    spotify::OAuthClient,
    types::{Session, SessionErrorTag, TokenResponse},
    utils, warning,
};

/// On-disk form of the session.
#[derive(Debug, Serialize, Deserialize)]
struct SignedSession {
    session: Session,
    signature: String,
}

impl Session {
    /// Session right after sign-in.
    pub fn from_token_response(token: TokenResponse, now: i64) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token.unwrap_or_default(),
            expires_at: now + token.expires_in,
            error: None,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Applies a refresh-token grant response.
    ///
    /// Spotify does not always rotate the refresh token; when the response
    /// omits it the previous one stays valid.
    pub fn apply_refresh(&mut self, token: TokenResponse, now: i64) {
        self.access_token = token.access_token;
        self.expires_at = now + token.expires_in;
        if let Some(refresh_token) = token.refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = refresh_token;
        }
        self.error = None;
    }
}

/// Owns the signed-in session and keeps its access token fresh.
pub struct SessionManager {
    session: Session,
    secret: String,
    path: PathBuf,
}

impl SessionManager {
    pub fn new(session: Session, secret: impl Into<String>) -> Self {
        Self::with_path(session, secret, Self::default_path())
    }

    pub fn with_path(session: Session, secret: impl Into<String>, path: PathBuf) -> Self {
        SessionManager {
            session,
            secret: secret.into(),
            path,
        }
    }

    pub fn default_path() -> PathBuf {
        config::data_dir().join("session.json")
    }

    pub async fn load(secret: &str) -> Result<Self, AppError> {
        Self::load_from(secret, Self::default_path()).await
    }

    /// Reads the session file and verifies its signature.
    ///
    /// # Arguments
    ///
    /// * `secret` - `SESSION_SECRET` the file was signed with
    /// * `path` - Location of the session file
    ///
    /// # Returns
    ///
    /// - `Ok(SessionManager)` - the stored session, bound to `path`
    /// - `Err(AppError::NotSignedIn)` - the file does not exist
    /// - `Err(AppError::Session)` - the signature does not match
    /// - `Err(AppError::Io | AppError::Serde)` - unreadable or malformed file
    pub async fn load_from(secret: &str, path: PathBuf) -> Result<Self, AppError> {
        let content = match async_fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotSignedIn);
            }
            Err(e) => return Err(e.into()),
        };

        let signed: SignedSession = serde_json::from_str(&content)?;
        let payload = serde_json::to_vec(&signed.session)?;
        if !utils::verify_signature(secret, &payload, &signed.signature) {
            return Err(AppError::Session(
                "session signature mismatch, please sign in again".to_string(),
            ));
        }

        Ok(Self::with_path(signed.session, secret, path))
    }

    /// Writes the session and its signature as pretty JSON, creating the
    /// parent directory when needed.
    pub async fn persist(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec(&self.session)?;
        let signed = SignedSession {
            session: self.session.clone(),
            signature: utils::sign(&self.secret, &payload)
                .map_err(|e| AppError::Session(format!("cannot sign session: {}", e)))?,
        };
        let json = serde_json::to_string_pretty(&signed)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Access token valid right now, refreshing it first when expired.
    ///
    /// A failed refresh tags the session with
    /// [`SessionErrorTag::RefreshAccessTokenError`]; from then on the user has
    /// to sign in again.
    ///
    /// # Arguments
    ///
    /// * `oauth` - Client for the refresh-token grant
    ///
    /// # Returns
    ///
    /// - `Ok(String)` - the current token, or a refreshed one (the refreshed
    ///   session is persisted right away)
    /// - `Err(AppError::ReauthRequired)` - the session is tagged or the
    ///   refresh just failed
    ///
    /// # Example
    ///
    /// ```
    /// let mut manager = SessionManager::load(&config.session_secret).await?;
    /// let token = manager.access_token(&oauth).await?;
    /// let user = client.current_user(&token).await?;
    /// ```
    pub async fn access_token(&mut self, oauth: &OAuthClient) -> Result<String, AppError> {
        if self.session.error.is_some() {
            return Err(AppError::ReauthRequired);
        }

        let now = Utc::now().timestamp();
        if !self.session.is_expired(now) {
            return Ok(self.session.access_token.clone());
        }

        match oauth.refresh(&self.session.refresh_token).await {
            Ok(token) => {
                self.session.apply_refresh(token, Utc::now().timestamp());
                if let Err(e) = self.persist().await {
                    warning!("Failed to save refreshed session: {}", e);
                }
                Ok(self.session.access_token.clone())
            }
            Err(e) => {
                warning!("Failed to refresh access token: {}", e);
                self.session.error = Some(SessionErrorTag::RefreshAccessTokenError);
                if let Err(e) = self.persist().await {
                    warning!("Failed to save session: {}", e);
                }
                Err(AppError::ReauthRequired)
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
