//! drive_backup CLI - Move backups between a build and Google Drive.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drive_backup::config::{
    DEFAULT_ACCESS_TOKEN_VAR, DEFAULT_CLIENT_ID_VAR, DEFAULT_CLIENT_SECRET_VAR,
    DEFAULT_REFRESH_TOKEN_VAR,
};
use drive_backup::console::{ProgressBar, Terminal};
use drive_backup::file_id::parse_file_id;
use drive_backup::transfer::Progress;
use drive_backup::{
    acquire_tokens, download, resolve, upload, CredentialConfig, CredentialVars, DriveClient,
    DriveError, Endpoints, Session, UploadRequest,
};

/// CLI tool for backing things up to Google Drive.
#[derive(Parser)]
#[command(name = "drive_backup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials are taken from the flag if given, else from the named variable.
#[derive(Args)]
struct CredentialArgs {
    /// OAuth client ID.
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Environment variable holding the client ID.
    #[arg(long, global = true, default_value = DEFAULT_CLIENT_ID_VAR)]
    client_id_var: String,

    /// OAuth client secret.
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// Environment variable holding the client secret.
    #[arg(long, global = true, default_value = DEFAULT_CLIENT_SECRET_VAR)]
    client_secret_var: String,

    /// OAuth access token.
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Environment variable holding the access token.
    #[arg(long, global = true, default_value = DEFAULT_ACCESS_TOKEN_VAR)]
    access_token_var: String,

    /// OAuth refresh token.
    #[arg(long, global = true)]
    refresh_token: Option<String>,

    /// Environment variable holding the refresh token.
    #[arg(long, global = true, default_value = DEFAULT_REFRESH_TOKEN_VAR)]
    refresh_token_var: String,
}

impl CredentialArgs {
    fn into_config(self) -> CredentialConfig {
        CredentialConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            vars: CredentialVars {
                client_id: self.client_id_var,
                client_secret: self.client_secret_var,
                access_token: self.access_token_var,
                refresh_token: self.refresh_token_var,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List files in a folder.
    List {
        /// Folder path from the root, one name per segment. Empty lists the root.
        segments: Vec<String>,
    },

    /// Upload a file.
    Upload {
        /// Local file to upload.
        file: PathBuf,

        /// Destination folder path, e.g. `backups/project-x`. Defaults to the root.
        #[arg(long, short = 'p', value_delimiter = '/')]
        path: Vec<String>,

        /// MIME type of the upload. Guessed from the extension when omitted.
        #[arg(long)]
        mime_type: Option<String>,

        /// Draw a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Download a file by ID or link.
    Download {
        /// File ID or Drive link.
        file: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,

        /// Draw a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Obtain access and refresh tokens interactively.
    ObtainTokens,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drive_backup=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.credentials.into_config();

    match cli.command {
        Commands::List { segments } => list(&config, &segments).await.context("list task failed"),

        Commands::Upload {
            file,
            path,
            mime_type,
            progress,
        } => upload_file(&config, file, &path, mime_type, progress)
            .await
            .context("upload task failed"),

        Commands::Download { file, to, progress } => download_file(&config, &file, &to, progress)
            .await
            .context("download task failed"),

        Commands::ObtainTokens => obtain_tokens(&config)
            .await
            .context("obtain-tokens task failed"),
    }
}

fn connect(config: &CredentialConfig) -> Result<DriveClient> {
    let credentials = config.resolve()?;
    let session = Session::new(credentials)?;
    Ok(DriveClient::new(session))
}

async fn list(config: &CredentialConfig, segments: &[String]) -> Result<()> {
    let client = connect(config)?;
    let folder = resolve(&client, segments)
        .await
        .with_context(|| format!("Failed to resolve path: {}", segments.join("/")))?;

    let files = client.list_children(folder.as_ref()).await?;

    if files.is_empty() {
        println!("No files found.");
    } else {
        for file in files {
            println!("{}", file);
        }
    }

    Ok(())
}

async fn upload_file(
    config: &CredentialConfig,
    file: PathBuf,
    path: &[String],
    mime_type: Option<String>,
    progress: bool,
) -> Result<()> {
    let client = connect(config)?;
    let parent = resolve(&client, path)
        .await
        .with_context(|| format!("Failed to resolve path: {}", path.join("/")))?;

    let content_type = mime_type.unwrap_or_else(|| {
        mime_guess::from_path(&file)
            .first_or_octet_stream()
            .to_string()
    });
    let request = UploadRequest {
        local_file: file,
        content_type,
        parent,
    };

    let mut bar = ProgressBar::new();
    let mut draw = |fraction: f64| bar.update(fraction);
    let on_progress: Progress<'_> = if progress { Some(&mut draw) } else { None };

    let result = upload(&client, &request, on_progress).await;
    bar.finish();

    let uploaded = result?;
    info!(id = %uploaded.id, "Uploaded {}", request.local_file.display());
    println!("Uploaded {} ({})", uploaded.name, uploaded.id);

    Ok(())
}

async fn download_file(config: &CredentialConfig, file: &str, to: &Path, progress: bool) -> Result<()> {
    let file_id = parse_file_id(file).with_context(|| format!("Invalid file URL or ID: {}", file))?;
    let client = connect(config)?;

    // Ensure destination directory exists
    if to.is_dir() || to.to_string_lossy().ends_with('/') {
        std::fs::create_dir_all(to)
            .with_context(|| format!("Failed to create directory: {:?}", to))?;
    } else if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    let mut bar = ProgressBar::new();
    let mut draw = |fraction: f64| bar.update(fraction);
    let on_progress: Progress<'_> = if progress { Some(&mut draw) } else { None };

    let result = download(&client, &file_id, to, on_progress).await;
    bar.finish();

    let downloaded = result?;
    println!("Saved to: {:?}", downloaded.path);

    Ok(())
}

async fn obtain_tokens(config: &CredentialConfig) -> Result<()> {
    let mut terminal = Terminal::attach().ok_or(DriveError::NoConsole)?;
    let secrets = config.resolve_client()?;

    acquire_tokens(&secrets, &Endpoints::default(), Some(&mut terminal)).await?;
    Ok(())
}
