use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

const UNKNOWN: &str = "Unknown";

fn youtube_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://(?:www\.)?(?:youtube\.com|youtu\.be)/").expect("valid URL pattern")
    })
}

/// Video metadata as reported by `yt-dlp --dump-single-json`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl VideoInfo {
    /// Uploader name used as the track artist
    pub fn artist(&self) -> &str {
        self.uploader
            .as_deref()
            .or(self.channel.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN)
    }
}

/// Check that a URL points at youtube.com or youtu.be over http(s)
pub fn validate_url(url: &str) -> bool {
    youtube_url_regex().is_match(url)
}

/// Split a comma separated list of URLs, keeping the valid ones.
///
/// Returns `(valid, rejected)`, both in input order. Blank entries are dropped.
pub fn split_urls(input: &str) -> (Vec<String>, Vec<String>) {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .partition(|u| validate_url(u))
}

/// Parse the JSON document printed by a metadata probe
pub fn parse_info(json: &[u8]) -> Result<VideoInfo> {
    let info: VideoInfo = serde_json::from_slice(json)?;
    if info.id.is_empty() {
        return Err(Error::ProbeFailed("missing video id".to_string()));
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://youtu.be/abc123"));
        assert!(validate_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate_url("http://youtube.com/shorts/xyz"));
        assert!(validate_url("https://youtube.com/"));

        assert!(!validate_url("ftp://youtube.com/x"));
        assert!(!validate_url("https://vimeo.com/x"));
        assert!(!validate_url("https://youtube.com"));
        assert!(!validate_url("https://m.youtube.com/watch?v=x"));
        assert!(!validate_url("youtube.com/watch?v=x"));
        assert!(!validate_url(" https://youtu.be/abc123"));
    }

    #[test]
    fn test_split_urls() {
        let (valid, rejected) =
            split_urls(" https://youtu.be/abc123 ,https://vimeo.com/x,, https://youtube.com/watch?v=1 ");
        assert_eq!(
            valid,
            vec!["https://youtu.be/abc123", "https://youtube.com/watch?v=1"]
        );
        assert_eq!(rejected, vec!["https://vimeo.com/x"]);

        let (valid, rejected) = split_urls("  ,  ");
        assert!(valid.is_empty());
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_parse_info() {
        let json = br#"{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","uploader":"Rick Astley","duration":212}"#;
        let info = parse_info(json).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.artist(), "Rick Astley");

        let json = br#"{"id":"abc","title":"No uploader"}"#;
        assert_eq!(parse_info(json).unwrap().artist(), "Unknown");

        let json = br#"{"id":"abc","title":"Channel only","channel":"Some Channel"}"#;
        assert_eq!(parse_info(json).unwrap().artist(), "Some Channel");

        assert!(parse_info(br#"{"id":"","title":"x"}"#).is_err());
        assert!(parse_info(b"not json").is_err());
    }
}
