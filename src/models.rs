//! Drive and OAuth2 wire types.

use serde::{Deserialize, Serialize};

/// MIME type Google Drive uses to mark folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Width of the name column in listings.
const NAME_COLUMN_WIDTH: usize = 50;

/// A file or folder as returned by Drive (the resolver's unit of work).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
    #[serde(default)]
    pub md5_checksum: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Drive reports sizes as decimal strings; accept plain numbers too.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    Option::<Size>::deserialize(deserializer)?
        .map(|size| match size {
            Size::Text(text) => text.parse::<u64>().map_err(serde::de::Error::custom),
            Size::Number(n) => Ok(n),
        })
        .transpose()
}

impl FileMetadata {
    /// Whether this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

impl std::fmt::Display for FileMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: String = self.name.chars().take(NAME_COLUMN_WIDTH).collect();
        let marker = match &self.md5_checksum {
            Some(md5) => format!("0x{}", md5.to_uppercase()),
            None if self.is_folder() => "folder".to_string(),
            None => "-".to_string(),
        };
        write!(f, "{:<width$} [{}]", name, marker, width = NAME_COLUMN_WIDTH)
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// File resource sent when creating a file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<&'a str>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// OAuth2 token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OAuth2 error body (`{"error": "invalid_grant", "error_description": "..."}`).
#[derive(Debug, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, mime: &str) -> FileMetadata {
        FileMetadata {
            id: "abc123".to_string(),
            name: name.to_string(),
            mime_type: Some(mime.to_string()),
            size: None,
            md5_checksum: None,
            parents: Vec::new(),
        }
    }

    #[test]
    fn test_size_as_string_or_number() {
        let text: FileMetadata =
            serde_json::from_str(r#"{"id": "a", "name": "a.tar", "size": "3145728"}"#).unwrap();
        let number: FileMetadata =
            serde_json::from_str(r#"{"id": "b", "name": "b.tar", "size": 42}"#).unwrap();
        let missing: FileMetadata = serde_json::from_str(r#"{"id": "c", "name": "c"}"#).unwrap();

        assert_eq!(text.size, Some(3145728));
        assert_eq!(number.size, Some(42));
        assert_eq!(missing.size, None);
    }

    #[test]
    fn test_size_rejects_garbage() {
        let result: Result<FileMetadata, _> =
            serde_json::from_str(r#"{"id": "a", "name": "a", "size": "big"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_folder_from_json() {
        let json = r#"{
            "id": "F1",
            "name": "backups",
            "mimeType": "application/vnd.google-apps.folder",
            "parents": ["root"]
        }"#;

        let metadata: FileMetadata = serde_json::from_str(json).unwrap();
        assert!(metadata.is_folder());
        assert_eq!(metadata.parents, vec!["root".to_string()]);
        assert_eq!(metadata.md5_checksum, None);
    }

    #[test]
    fn test_is_folder() {
        assert!(entry("backups", FOLDER_MIME_TYPE).is_folder());
        assert!(!entry("notes.txt", "text/plain").is_folder());
    }

    #[test]
    fn test_display_truncates_long_names() {
        let long = "x".repeat(80);
        let display = entry(&long, "text/plain").to_string();
        assert_eq!(display, format!("{} [-]", "x".repeat(50)));
    }

    #[test]
    fn test_display_checksum_upper_case() {
        let mut metadata = entry("backup.zip", "application/zip");
        metadata.md5_checksum = Some("abcdef".to_string());
        metadata.size = Some(2048);

        assert_eq!(
            metadata.to_string(),
            format!("{:<50} [0xABCDEF]", "backup.zip")
        );
    }

    #[test]
    fn test_display_marker_follows_name_column() {
        let display = entry("notes.txt", "text/plain").to_string();
        assert_eq!(display.len(), 54);
        assert_eq!(&display[50..], " [-]");
    }

    #[test]
    fn test_display_folder() {
        let display = entry("backups", FOLDER_MIME_TYPE).to_string();
        assert!(display.ends_with("[folder]"));
    }

    #[test]
    fn test_new_file_omits_empty_parents() {
        let body = NewFile {
            name: "a.txt",
            mime_type: "text/plain",
            parents: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mimeType"], "text/plain");
        assert!(json.get("parents").is_none());
    }
}
