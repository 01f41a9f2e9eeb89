use reqwest::{Client, header::AUTHORIZATION};

use crate::{config::Config, error::ApiError, types::TokenResponse, utils};

use super::check_status;

/// Talks to the Spotify accounts service.
///
/// Both grants authenticate the application with a basic-auth header built
/// from the client id and secret.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    redirect_uri: String,
    scope: String,
}

impl OAuthClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            redirect_uri: config.redirect_uri(),
            scope: config.scope.clone(),
        }
    }

    /// URL the user opens to grant access.
    ///
    /// # Arguments
    ///
    /// * `state` - Random value echoed back to the callback, see
    ///   [`utils::generate_state`](crate::utils::generate_state)
    ///
    /// # Returns
    ///
    /// - `Ok(String)` - the authorization URL with client id, redirect URI,
    ///   scope and state
    /// - `Err(String)` - `SPOTIFY_AUTH_URL` is not a valid URL
    pub fn authorize_url(&self, state: &str) -> Result<String, String> {
        let url = reqwest::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| format!("Invalid SPOTIFY_AUTH_URL '{}': {}", self.auth_url, e))?;
        Ok(url.to_string())
    }

    /// Exchanges the authorization code from the callback for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ApiError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
        ])
        .await
    }

    /// Refresh-token grant. The response may omit `refresh_token`.
    ///
    /// # Errors
    ///
    /// A rejected refresh token comes back as [`ApiError::Unauthorized`] or
    /// [`ApiError::Status`] with the `error_description` of the accounts service.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, ApiError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(
                AUTHORIZATION,
                utils::basic_auth_header(&self.client_id, &self.client_secret),
            )
            .form(form)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
