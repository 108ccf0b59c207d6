//! Video references and identifier extraction
//!
//! A video id is the 11-character token (`[0-9A-Za-z_-]`) that follows either a
//! `v=` query marker or a path separator, e.g. `watch?v=<id>`, `youtu.be/<id>`
//! or `/shorts/<id>`. The leftmost such token wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static VIDEO_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("video id pattern is valid")
});

/// Length of a platform video identifier
pub const VIDEO_ID_LEN: usize = 11;

/// Extract the canonical video id from a platform URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// One side of an input row: the URL as given plus the id derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub raw_url: String,
    pub video_id: Option<String>,
}

impl VideoRef {
    /// Derive the reference once; the id is never recomputed afterwards
    pub fn from_url(raw_url: &str) -> Self {
        let raw_url = raw_url.trim().to_string();
        let video_id = extract_video_id(&raw_url);
        Self { raw_url, video_id }
    }

    pub fn id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.video_id {
            Some(id) => write!(f, "{} ({})", self.raw_url, id),
            None => write!(f, "{} (no id)", self.raw_url),
        }
    }
}
