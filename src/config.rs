//! Credential configuration.
//!
//! Every credential is resolved in the same order: an explicit value, then a
//! named environment variable, then a `MissingCredential` error. The variable
//! names themselves are configurable.

use std::fmt;

use crate::error::{DriveError, Result};

pub const DEFAULT_CLIENT_ID_VAR: &str = "GDRIVE_CLIENT_ID";
pub const DEFAULT_CLIENT_SECRET_VAR: &str = "GDRIVE_CLIENT_SECRET";
pub const DEFAULT_ACCESS_TOKEN_VAR: &str = "GDRIVE_ACCESS_TOKEN";
pub const DEFAULT_REFRESH_TOKEN_VAR: &str = "GDRIVE_REFRESH_TOKEN";

/// The full credential set needed for authenticated Drive calls.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Fail on the first empty field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("client ID", &self.client_id),
            ("client secret", &self.client_secret),
            ("access token", &self.access_token),
            ("refresh token", &self.refresh_token),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(DriveError::MissingCredential(format!(
                    "Google Drive {label} must not be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn secrets(&self) -> ClientSecrets {
        ClientSecrets {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// OAuth client id and secret; all the token-acquisition flow needs.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Names of the environment variables consulted for each credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialVars {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID_VAR.to_string(),
            client_secret: DEFAULT_CLIENT_SECRET_VAR.to_string(),
            access_token: DEFAULT_ACCESS_TOKEN_VAR.to_string(),
            refresh_token: DEFAULT_REFRESH_TOKEN_VAR.to_string(),
        }
    }
}

/// Credential values as supplied by the caller, before fallback resolution.
#[derive(Debug, Clone, Default)]
pub struct CredentialConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub vars: CredentialVars,
}

impl CredentialConfig {
    /// Resolve all four credentials against the process environment.
    pub fn resolve(&self) -> Result<Credentials> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve all four credentials using `lookup` for environment variables.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secrets = self.resolve_client_with(&lookup)?;
        Ok(Credentials {
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            access_token: pick(
                "access token",
                self.access_token.as_deref(),
                &self.vars.access_token,
                &lookup,
            )?,
            refresh_token: pick(
                "refresh token",
                self.refresh_token.as_deref(),
                &self.vars.refresh_token,
                &lookup,
            )?,
        })
    }

    /// Resolve only the client id and secret.
    pub fn resolve_client(&self) -> Result<ClientSecrets> {
        self.resolve_client_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_client_with<F>(&self, lookup: F) -> Result<ClientSecrets>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ClientSecrets {
            client_id: pick(
                "client ID",
                self.client_id.as_deref(),
                &self.vars.client_id,
                &lookup,
            )?,
            client_secret: pick(
                "client secret",
                self.client_secret.as_deref(),
                &self.vars.client_secret,
                &lookup,
            )?,
        })
    }
}

fn pick<F>(label: &str, explicit: Option<&str>, var: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Ok(value.to_string());
    }
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            DriveError::MissingCredential(format!(
                "Google Drive {label} must be given explicitly or via ${var}"
            ))
        })
}
