//! drive_backup - Push backups to and pull them from Google Drive.
//!
//! This library provides functionality to:
//! - Resolve a folder path like `["backups", "project-x"]` to a Drive folder
//! - List the files in a folder
//! - Upload a file in 1 MiB chunks, optionally reporting progress
//! - Download a file by ID in 1 MiB chunks, optionally reporting progress
//! - Mint access/refresh tokens through the OAuth2 authorization-code flow
//!
//! # Example
//!
//! ```no_run
//! use drive_backup::{resolve, upload, CredentialConfig, DriveClient, Session, UploadRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let credentials = CredentialConfig::default().resolve()?;
//!     let client = DriveClient::new(Session::new(credentials)?);
//!
//!     let parent = resolve(&client, &["backups", "project-x"]).await?;
//!     let request = UploadRequest {
//!         local_file: "build/backup.tar.gz".into(),
//!         content_type: "application/gzip".to_string(),
//!         parent,
//!     };
//!     let mut print = |fraction: f64| println!("{:.0}%", fraction * 100.0);
//!     let uploaded = upload(&client, &request, Some(&mut print)).await?;
//!     println!("{}", uploaded.id);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod file_id;
pub mod models;
pub mod oauth;
pub mod resolver;
pub mod transfer;

// Re-exports for convenience
pub use auth::{Endpoints, Session};
pub use client::DriveClient;
pub use config::{ClientSecrets, CredentialConfig, CredentialVars, Credentials};
pub use error::{DriveError, Result};
pub use models::FileMetadata;
pub use oauth::{acquire_tokens, TokenGrant};
pub use resolver::resolve;
pub use transfer::{download, upload, DownloadedFile, UploadRequest, CHUNK_SIZE};
