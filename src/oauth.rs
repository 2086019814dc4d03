//! Interactive authorization-code flow for minting Drive tokens.

use reqwest::Client;
use tracing::debug;

use crate::auth::{describe_oauth_error, Endpoints, DRIVE_SCOPE};
use crate::config::ClientSecrets;
use crate::console::{highlight, Console};
use crate::error::{DriveError, Result};
use crate::models::TokenResponse;

/// Out-of-band redirect target; the consent page shows the code to the user.
pub const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens issued by the authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// Build the consent URL the user has to open.
pub fn authorization_url(secrets: &ClientSecrets, endpoints: &Endpoints) -> Result<String> {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("redirect_uri", REDIRECT_URI),
        ("response_type", "code"),
        ("scope", DRIVE_SCOPE),
        ("access_type", "offline"),
    ];

    let url = url::Url::parse_with_params(&endpoints.auth_uri, &params)
        .map_err(|e| DriveError::InvalidArgument(format!("bad authorization URI: {}", e)))?;
    Ok(url.to_string())
}

/// Walk the user through the consent page and exchange the pasted code.
///
/// Fails with `NoConsole` before any network call when no console is given.
pub async fn acquire_tokens(
    secrets: &ClientSecrets,
    endpoints: &Endpoints,
    console: Option<&mut dyn Console>,
) -> Result<TokenGrant> {
    let console = console.ok_or(DriveError::NoConsole)?;

    if secrets.client_id.trim().is_empty() {
        return Err(DriveError::MissingCredential(
            "Google Drive client ID must not be empty".to_string(),
        ));
    }
    if secrets.client_secret.trim().is_empty() {
        return Err(DriveError::MissingCredential(
            "Google Drive client secret must not be empty".to_string(),
        ));
    }

    let url = authorization_url(secrets, endpoints)?;
    console.print_line(&format!(
        "Navigate to the following url: {}, and then paste the authorization code here:",
        highlight(&url)
    ))?;

    let code = console.read_line()?;
    let code = code.trim();
    if code.is_empty() {
        return Err(DriveError::InvalidArgument(
            "authorization code must not be empty".to_string(),
        ));
    }

    let grant = exchange_code(secrets, endpoints, code).await?;

    let expiry = grant
        .expires_in
        .map(|secs| format!(" It will expire in {} seconds.", secs))
        .unwrap_or_default();
    console.print_line(&format!(
        "Your access token is {}. Store it somewhere for future use.{}",
        highlight(&grant.access_token),
        expiry
    ))?;
    match &grant.refresh_token {
        Some(refresh) => console.print_line(&format!(
            "Your refresh token is {}. Store it somewhere for future use.",
            highlight(refresh)
        ))?,
        None => console.print_line(
            "No refresh token was issued. Revoke the app's access and run this again to get one.",
        )?,
    }

    Ok(grant)
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    secrets: &ClientSecrets,
    endpoints: &Endpoints,
    code: &str,
) -> Result<TokenGrant> {
    debug!(token_uri = %endpoints.token_uri, "Exchanging authorization code");

    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", REDIRECT_URI),
        ("grant_type", "authorization_code"),
    ];

    let response = Client::new()
        .post(&endpoints.token_uri)
        .form(&params)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(DriveError::TokenExchangeError(describe_oauth_error(
            status, &body,
        )));
    }

    let token: TokenResponse = response.json().await?;
    Ok(TokenGrant {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_in: token.expires_in,
    })
}
