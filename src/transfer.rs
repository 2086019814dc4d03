//! Chunked upload and download of single files.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::header::{CONTENT_RANGE, LOCATION, RANGE};
use reqwest::{Response, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::client::{ensure_success, DriveClient, FILE_FIELDS};
use crate::error::{DriveError, Result};
use crate::models::{FileMetadata, NewFile};

/// Transfer granularity (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Status Drive uses for "chunk stored, send the next one".
const RESUME_INCOMPLETE: u16 = 308;

/// Progress callback, invoked with the fraction complete in `[0, 1]`.
pub type Progress<'a> = Option<&'a mut dyn FnMut(f64)>;

/// What to upload and where.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub local_file: PathBuf,
    pub content_type: String,
    /// Destination folder; `None` uploads to the root.
    pub parent: Option<FileMetadata>,
}

/// Upload a local file through a resumable session, one chunk at a time.
pub async fn upload(
    client: &DriveClient,
    request: &UploadRequest,
    mut on_progress: Progress<'_>,
) -> Result<FileMetadata> {
    let (name, total) = inspect_local_file(&request.local_file).await?;
    if request.content_type.trim().is_empty() {
        return Err(DriveError::InvalidArgument(
            "content type must not be empty".to_string(),
        ));
    }

    let uploaded = upload_chunks(client, request, &name, total, &mut on_progress)
        .await
        .map_err(DriveError::into_transfer)?;

    info!(id = %uploaded.id, name = %uploaded.name, bytes = total, "Upload complete");
    Ok(uploaded)
}

/// A finished download and where it was written.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub metadata: FileMetadata,
    pub path: PathBuf,
}

/// Download a file by ID to `destination`.
///
/// When `destination` is a directory the last component of the remote name
/// is appended, so the file always lands inside it.
pub async fn download(
    client: &DriveClient,
    file_id: &str,
    destination: &Path,
    mut on_progress: Progress<'_>,
) -> Result<DownloadedFile> {
    if file_id.trim().is_empty() {
        return Err(DriveError::InvalidArgument(
            "file ID must not be empty".to_string(),
        ));
    }

    let (metadata, path) = download_chunks(client, file_id, destination, &mut on_progress)
        .await
        .map_err(DriveError::into_transfer)?;

    info!(id = %metadata.id, path = %path.display(), "Download complete");
    Ok(DownloadedFile { metadata, path })
}

/// Return the file name and length, or `InvalidArgument` if it is not a regular file.
async fn inspect_local_file(path: &Path) -> Result<(String, u64)> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        DriveError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(DriveError::InvalidArgument(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            DriveError::InvalidArgument(format!("{} has no usable file name", path.display()))
        })?;

    Ok((name.to_string(), metadata.len()))
}

async fn upload_chunks(
    client: &DriveClient,
    request: &UploadRequest,
    name: &str,
    total: u64,
    on_progress: &mut Progress<'_>,
) -> Result<FileMetadata> {
    let session_uri = start_upload_session(client, request, name, total).await?;
    let session = client.session();

    if total == 0 {
        let response = session
            .send(|http| {
                http.put(&session_uri)
                    .header(CONTENT_RANGE, "bytes */0")
                    .body(Vec::<u8>::new())
            })
            .await?;
        let uploaded = ensure_success(response).await?.json().await?;
        report(on_progress, 1.0);
        return Ok(uploaded);
    }

    let mut file = File::open(&request.local_file).await?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;

    loop {
        let read = read_chunk(&mut file, &mut buffer).await?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} shrank during upload", request.local_file.display()),
            )
            .into());
        }

        let chunk = buffer[..read].to_vec();
        let chunk_end = sent + read as u64;
        let range = format!("bytes {}-{}/{}", sent, chunk_end - 1, total);
        debug!(range = %range, "Uploading chunk");

        let response = session
            .send(|http| {
                http.put(&session_uri)
                    .header(CONTENT_RANGE, range.as_str())
                    .body(chunk.clone())
            })
            .await?;

        if response.status().as_u16() == RESUME_INCOMPLETE {
            let stored = stored_bytes(&response)?;
            if stored <= sent || stored > chunk_end {
                return Err(DriveError::ApiError {
                    status: RESUME_INCOMPLETE,
                    message: format!(
                        "server confirmed {} bytes after a chunk covering {}..{}",
                        stored, sent, chunk_end
                    ),
                });
            }
            if stored >= total {
                return Err(DriveError::ApiError {
                    status: RESUME_INCOMPLETE,
                    message: "upload session still incomplete after the last chunk".to_string(),
                });
            }
            if stored < chunk_end {
                debug!(stored, expected = chunk_end, "Chunk partially stored, resuming");
                file.seek(SeekFrom::Start(stored)).await?;
            }
            sent = stored;
            report(on_progress, sent as f64 / total as f64);
            continue;
        }

        let uploaded = ensure_success(response).await?.json().await?;
        report(on_progress, 1.0);
        return Ok(uploaded);
    }
}

/// Bytes the session holds according to a `308` reply's `Range: bytes=0-N`.
/// No header means nothing was stored.
fn stored_bytes(response: &Response) -> Result<u64> {
    let Some(value) = response.headers().get(RANGE) else {
        return Ok(0);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().strip_prefix("bytes=0-"))
        .and_then(|last| last.parse::<u64>().ok())
        .map(|last| last + 1)
        .ok_or_else(|| DriveError::ApiError {
            status: RESUME_INCOMPLETE,
            message: format!("malformed Range header in upload reply: {:?}", value),
        })
}

/// Create the resumable session and return its URI.
async fn start_upload_session(
    client: &DriveClient,
    request: &UploadRequest,
    name: &str,
    total: u64,
) -> Result<String> {
    let session = client.session();
    let url = format!("{}/files", session.endpoints().upload_base);
    let body = NewFile {
        name,
        mime_type: &request.content_type,
        parents: request.parent.iter().map(|p| p.id.as_str()).collect(),
    };
    let length = total.to_string();

    let response = session
        .send(|http| {
            http.post(&url)
                .query(&[("uploadType", "resumable"), ("fields", FILE_FIELDS)])
                .header("X-Upload-Content-Type", request.content_type.as_str())
                .header("X-Upload-Content-Length", length.as_str())
                .json(&body)
        })
        .await?;
    let response = ensure_success(response).await?;

    let session_uri = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DriveError::ApiError {
            status: response.status().as_u16(),
            message: "No upload URL in response".to_string(),
        })?
        .to_string();

    debug!(name, bytes = total, "Opened resumable upload session");
    Ok(session_uri)
}

async fn download_chunks(
    client: &DriveClient,
    file_id: &str,
    destination: &Path,
    on_progress: &mut Progress<'_>,
) -> Result<(FileMetadata, PathBuf)> {
    let metadata = client.get_file(file_id).await?;
    let into_dir = tokio::fs::metadata(destination)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    let target = if into_dir {
        destination.join(local_name(&metadata.name)?)
    } else {
        destination.to_path_buf()
    };

    let session = client.session();
    let url = format!("{}/files/{}", session.endpoints().api_base, file_id);
    let mut out = File::create(&target).await?;

    match metadata.size {
        Some(total) if total > 0 => {
            let mut received: u64 = 0;
            while received < total {
                let end = (received + CHUNK_SIZE as u64).min(total) - 1;
                let range = format!("bytes={}-{}", received, end);
                debug!(range = %range, "Downloading chunk");

                let response = session
                    .send(|http| {
                        http.get(&url)
                            .query(&[("alt", "media")])
                            .header(RANGE, range.as_str())
                    })
                    .await?;
                let response = ensure_success(response).await?;

                // Range ignored: the whole body is coming back at once.
                if response.status() == StatusCode::OK {
                    if received > 0 {
                        return Err(DriveError::ApiError {
                            status: StatusCode::OK.as_u16(),
                            message: "server stopped honoring range requests".to_string(),
                        });
                    }
                    write_body(&mut out, response).await?;
                    report(on_progress, 1.0);
                    break;
                }

                let written = write_body(&mut out, response).await?;
                if written == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("empty chunk at offset {}", received),
                    )
                    .into());
                }
                received += written;
                report(on_progress, (received as f64 / total as f64).min(1.0));
            }
        }
        _ => {
            let response = session
                .send(|http| http.get(&url).query(&[("alt", "media")]))
                .await?;
            let response = ensure_success(response).await?;
            write_body(&mut out, response).await?;
            report(on_progress, 1.0);
        }
    }

    out.flush().await?;
    Ok((metadata, target))
}

/// Last component of a remote name, usable as a file name inside a directory.
fn local_name(remote: &str) -> Result<&str> {
    Path::new(remote)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            DriveError::InvalidArgument(format!(
                "remote name {:?} cannot be used as a local file name",
                remote
            ))
        })
}

/// Stream a response body into `out`, returning the number of bytes written.
async fn write_body(out: &mut File, response: Response) -> Result<u64> {
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    Ok(written)
}

/// Fill `buffer` as far as the reader allows; returns bytes read.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn report(on_progress: &mut Progress<'_>, fraction: f64) {
    if let Some(callback) = on_progress.as_deref_mut() {
        callback(fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_chunk_fills_buffer() {
        let data = vec![7u8; CHUNK_SIZE + 10];
        let mut reader = data.as_slice();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        assert_eq!(read_chunk(&mut reader, &mut buffer).await.unwrap(), CHUNK_SIZE);
        assert_eq!(read_chunk(&mut reader, &mut buffer).await.unwrap(), 10);
        assert_eq!(read_chunk(&mut reader, &mut buffer).await.unwrap(), 0);
    }

    #[test]
    fn test_local_name_keeps_last_component() {
        assert_eq!(local_name("backup.tar.gz").unwrap(), "backup.tar.gz");
        assert_eq!(local_name("../escaped.txt").unwrap(), "escaped.txt");
        assert_eq!(local_name("a/b/../c.bin").unwrap(), "c.bin");
        assert_eq!(local_name("/etc/passwd").unwrap(), "passwd");
    }

    #[test]
    fn test_local_name_rejects_dot_entries() {
        for name in ["", ".", "..", "a/..", "/"] {
            assert!(
                matches!(local_name(name), Err(DriveError::InvalidArgument(_))),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn test_report_without_callback() {
        let mut progress: Progress<'_> = None;
        report(&mut progress, 0.5);
    }

    #[test]
    fn test_report_with_callback() {
        let mut seen = Vec::new();
        let mut record = |f: f64| seen.push(f);
        let mut progress: Progress<'_> = Some(&mut record);
        report(&mut progress, 0.25);
        report(&mut progress, 1.0);
        drop(progress);
        assert_eq!(seen, vec![0.25, 1.0]);
    }
}
