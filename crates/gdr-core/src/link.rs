use std::{fmt, sync::OnceLock};

use regex::Regex;

const FOLDER_URL_BASE: &str = "https://drive.google.com/drive/folders/";

/// Opaque Google Drive folder token, as found after `folders/` in a share link.
///
/// Only `[A-Za-z0-9_-]` can appear, so it is safe to embed in a path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FolderId(String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical share URL handed to the downloader.
    pub fn url(&self) -> String {
        format!("{FOLDER_URL_BASE}{}", self.0)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn folder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"folders/([A-Za-z0-9_-]+)").expect("valid folder regex"))
}

/// Find the first `folders/<token>` in free-form text.
///
/// No check is made that the folder exists or is shared; the downloader finds out.
pub fn extract_folder_id(text: &str) -> Option<FolderId> {
    folder_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| FolderId(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> Option<String> {
        extract_folder_id(text).map(|f| f.as_str().to_string())
    }

    #[test]
    fn extracts_token_from_share_link() {
        assert_eq!(
            id("check https://drive.google.com/drive/folders/XYZ please").as_deref(),
            Some("XYZ")
        );
        assert_eq!(
            id("https://drive.google.com/drive/u/0/folders/1aB-c_D9?usp=sharing").as_deref(),
            Some("1aB-c_D9")
        );
    }

    #[test]
    fn token_stops_at_first_disallowed_char() {
        assert_eq!(id("folders/abc.def").as_deref(), Some("abc"));
        assert_eq!(id("folders/abc/def").as_deref(), Some("abc"));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(id("folders/one and folders/two").as_deref(), Some("one"));
    }

    #[test]
    fn no_token_is_not_found() {
        assert_eq!(id(""), None);
        assert_eq!(id("hello there"), None);
        assert_eq!(id("https://drive.google.com/file/d/abc/view"), None);
        assert_eq!(id("folders/"), None);
        assert_eq!(id("folders/ spaced"), None);
    }

    #[test]
    fn canonical_url() {
        let f = extract_folder_id("folders/abc123").unwrap();
        assert_eq!(f.url(), "https://drive.google.com/drive/folders/abc123");
        assert_eq!(f.to_string(), "abc123");
    }
}
