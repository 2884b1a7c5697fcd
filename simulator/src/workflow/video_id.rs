//! Deriving a directory-safe video id from a submitted URL.

use regex::Regex;
use std::sync::OnceLock;

fn youtube_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{6,})").expect("valid id pattern"))
}

fn valid_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9A-Za-z_-]{3,128}$").expect("valid id pattern"))
}

/// Best-effort YouTube id from `watch?v=ID` or `youtu.be/ID` style URLs.
pub fn extract_video_id_from_url(url: &str) -> Option<String> {
    youtube_id_pattern()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Keeps `[0-9A-Za-z_-]`, truncated to 128 characters.
pub fn sanitize_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(128)
        .collect()
}

pub fn validate_video_id(video_id: &str) -> bool {
    valid_id_pattern().is_match(video_id)
}

/// Id used for the results directory, or `None` when nothing usable remains.
pub fn derive_video_id(url: &str) -> Option<String> {
    let candidate = extract_video_id_from_url(url).unwrap_or_else(|| sanitize_id(url));
    validate_video_id(&candidate).then_some(candidate)
}
