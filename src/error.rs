//! Error types for the drive_backup crate.

use thiserror::Error;

/// Errors that can occur when talking to Google Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid Google Drive path, no entry named '{segment}'. Forgot to create folders?")]
    PathNotFound { segment: String },

    #[error("Invalid Google Drive path, '{name}' exists but it's not a folder")]
    NotAFolder { name: String },

    #[error("This operation cannot be run without an interactive console")]
    NoConsole,

    #[error("Transfer failed: {0}")]
    Transfer(#[source] Box<DriveError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeError(String),
}

impl DriveError {
    /// Wrap a fault raised in the middle of an upload or download.
    ///
    /// Argument errors stay as they are, everything else becomes `Transfer`.
    pub fn into_transfer(self) -> Self {
        match self {
            e @ (DriveError::InvalidArgument(_) | DriveError::Transfer(_)) => e,
            other => DriveError::Transfer(Box::new(other)),
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
