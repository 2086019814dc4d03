//! Google Drive API client for metadata queries.

use reqwest::Response;
use tracing::debug;

use crate::auth::Session;
use crate::error::{DriveError, Result};
use crate::models::{ApiErrorResponse, FileListResponse, FileMetadata};

/// Fields requested for every file resource.
pub const FILE_FIELDS: &str = "id, name, size, mimeType, md5Checksum, parents";

/// Client for querying Google Drive metadata.
#[derive(Clone)]
pub struct DriveClient {
    session: Session,
}

impl DriveClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run a query and return only the first page of results.
    pub async fn query_page(&self, query: &str) -> Result<Vec<FileMetadata>> {
        Ok(self.fetch_page(query, None).await?.files)
    }

    /// Run a query and follow `nextPageToken` until exhausted.
    pub async fn query_all(&self, query: &str) -> Result<Vec<FileMetadata>> {
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(query, page_token.as_deref()).await?;
            all_files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }

    /// List the direct children of a folder, or of the root when `None`.
    pub async fn list_children(&self, parent: Option<&FileMetadata>) -> Result<Vec<FileMetadata>> {
        let parent_id = parent.map(|p| p.id.as_str()).unwrap_or("root");
        let query = format!("'{}' in parents", escape_query(parent_id));
        self.query_all(&query).await
    }

    /// Get file metadata by ID.
    pub async fn get_file(&self, file_id: &str) -> Result<FileMetadata> {
        let url = format!("{}/files/{}", self.session.endpoints().api_base, file_id);
        debug!(file_id, "Fetching file metadata");

        let response = self
            .session
            .send(|http| http.get(&url).query(&[("fields", FILE_FIELDS)]))
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_page(&self, query: &str, page_token: Option<&str>) -> Result<FileListResponse> {
        let url = format!("{}/files", self.session.endpoints().api_base);
        let fields = format!("nextPageToken, files({})", FILE_FIELDS);
        debug!(query, "Querying files");

        let response = self
            .session
            .send(|http| {
                let request = http
                    .get(&url)
                    .query(&[("q", query), ("fields", fields.as_str())]);
                match page_token {
                    Some(token) => request.query(&[("pageToken", token)]),
                    None => request,
                }
            })
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Turn a non-2xx response into `DriveError::ApiError`.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(DriveError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}
