//! Parsing of Drive file identifiers from links.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DriveError, Result};

/// Link shapes that carry a file or folder ID in their first capture group.
static LINK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([A-Za-z0-9_-]+)",
        r"^https?://drive\.google\.com/file/(?:u/\d+/)?d/([A-Za-z0-9_-]+)",
        r"^https?://docs\.google\.com/[a-z]+/(?:u/\d+/)?d/([A-Za-z0-9_-]+)",
        r"^https?://drive\.google\.com/(?:open|uc)\?(?:[^#]*&)?id=([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("invalid link pattern"))
    .collect()
});

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid ID pattern"));

/// Accept either a bare Drive ID or a Drive/Docs link and return the ID.
///
/// ```
/// use drive_backup::file_id::parse_file_id;
///
/// let id = parse_file_id("https://drive.google.com/file/d/1abc123/view").unwrap();
/// assert_eq!(id, "1abc123");
///
/// assert_eq!(parse_file_id("1abc123").unwrap(), "1abc123");
/// ```
pub fn parse_file_id(input: &str) -> Result<String> {
    let trimmed = input.trim();

    let from_link = LINK_PATTERNS
        .iter()
        .find_map(|re| re.captures(trimmed).and_then(|c| c.get(1)));
    if let Some(id) = from_link {
        return Ok(id.as_str().to_string());
    }

    if BARE_ID.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(DriveError::InvalidUrlOrId(input.to_string()))
}
