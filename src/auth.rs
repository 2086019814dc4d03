//! OAuth2 credential session for Google APIs.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::error::{DriveError, Result};
use crate::models::{OAuthErrorResponse, TokenResponse};

/// Base URL for Google Drive API v3.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upload URL for Google Drive API.
pub const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Google OAuth2 token endpoint.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google OAuth2 consent page.
pub const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google Drive API scope.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Remote endpoints used by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub upload_base: String,
    pub token_uri: String,
    pub auth_uri: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
            token_uri: TOKEN_URI.to_string(),
            auth_uri: AUTH_URI.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one server, e.g. a local mock.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: base.to_string(),
            upload_base: base.to_string(),
            token_uri: format!("{}/token", base),
            auth_uri: format!("{}/auth", base),
        }
    }
}

/// An authenticated handle to the Drive API.
///
/// Construction does no network I/O. The access token is used as given until
/// the API rejects it, at which point the refresh token is exchanged for a new
/// one and the request is re-issued once.
#[derive(Clone)]
pub struct Session {
    credentials: Arc<Credentials>,
    endpoints: Arc<Endpoints>,
    http: Client,
    access_token: Arc<RwLock<String>>,
}

impl Session {
    /// Create a session against the Google endpoints.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    /// Create a session against custom endpoints.
    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Result<Self> {
        credentials.validate()?;
        let access_token = credentials.access_token.clone();
        Ok(Self {
            credentials: Arc::new(credentials),
            endpoints: Arc::new(endpoints),
            http: Client::new(),
            access_token: Arc::new(RwLock::new(access_token)),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The access token currently in use.
    pub async fn access_token(&self) -> String {
        self.access_token.read().await.clone()
    }

    /// Send a request built by `build`, with bearer auth attached.
    ///
    /// `build` may be called twice: once with the current token and, after a
    /// `401`, once more with the refreshed one.
    pub async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.access_token().await;
        let response = build(&self.http).bearer_auth(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Access token was rejected, refreshing it");
        let token = self.refresh().await?;
        Ok(build(&self.http).bearer_auth(&token).send().await?)
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<String> {
        debug!(token_uri = %self.endpoints.token_uri, "Refreshing access token");

        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.endpoints.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenRefreshError(describe_oauth_error(
                status, &body,
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let mut current = self.access_token.write().await;
        *current = token_response.access_token.clone();

        Ok(token_response.access_token)
    }
}

/// Render an OAuth2 error body, falling back to the raw text.
pub(crate) fn describe_oauth_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("Status {}: {} ({})", status, err.error, description),
            None => format!("Status {}: {}", status, err.error),
        },
        Err(_) => format!("Status {}: {}", status, body),
    }
}
