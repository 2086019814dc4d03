//! Resolve a human-readable folder path to a Drive folder.

use tracing::debug;

use crate::client::{escape_query, DriveClient};
use crate::error::{DriveError, Result};
use crate::models::FileMetadata;

/// Walk `segments` from the root and return the deepest folder.
///
/// An empty path means the root and yields `None` without touching the API.
/// Each segment is looked up by name under the folder found so far; only the
/// first page of results is consulted and the first match is taken, so
/// duplicate names under one parent resolve in whatever order Drive returns.
pub async fn resolve<S: AsRef<str>>(
    client: &DriveClient,
    segments: &[S],
) -> Result<Option<FileMetadata>> {
    let mut current: Option<FileMetadata> = None;

    for segment in segments {
        let segment = segment.as_ref();
        let query = segment_query(segment, current.as_ref());
        debug!(segment, query = %query, "Resolving path segment");

        let found = client.query_page(&query).await?.into_iter().next();
        match found {
            Some(entry) => current = Some(entry),
            None => {
                return Err(DriveError::PathNotFound {
                    segment: segment.to_string(),
                })
            }
        }
    }

    match current {
        Some(entry) if !entry.is_folder() => Err(DriveError::NotAFolder { name: entry.name }),
        resolved => Ok(resolved),
    }
}

/// Build the name (and parent) filter for one segment.
pub fn segment_query(segment: &str, parent: Option<&FileMetadata>) -> String {
    let name_filter = format!("name = '{}'", escape_query(segment));
    match parent {
        Some(parent) => format!("{} and '{}' in parents", name_filter, escape_query(&parent.id)),
        None => name_filter,
    }
}
