//! Comment records, pages and per-video results

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::domain::errors::FailureReason;

/// A single comment as returned by the comment service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub published_at: DateTime<FixedOffset>,
    pub author_name: String,
    pub like_count: u64,
}

/// One page of comments. Consumed straight into a running list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPage {
    pub items: Vec<Comment>,
    pub page_index: u32,
    pub total_pages: u32,
}

impl CommentPage {
    /// The page callers get back when the service could not be reached
    pub fn empty(page_index: u32) -> Self {
        Self {
            items: Vec::new(),
            page_index,
            total_pages: 0,
        }
    }

    /// A zero page count means the service has nothing cached for the video yet
    pub fn is_cold(&self) -> bool {
        self.total_pages == 0
    }
}

/// Snapshot of video metadata used for the threshold gate and export headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoStats {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<FixedOffset>,
    pub comment_count: u64,
}

/// Complete, ordered comment list for one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoResult {
    pub video_id: String,
    pub title: String,
    pub upload_date: String,
    pub upload_time: String,
    pub comments: Vec<Comment>,
}

impl VideoResult {
    pub fn from_stats(stats: &VideoStats, comments: Vec<Comment>) -> Self {
        let (upload_date, upload_time) = split_datetime(&stats.published_at);
        Self {
            video_id: stats.video_id.clone(),
            title: stats.title.clone(),
            upload_date,
            upload_time,
            comments,
        }
    }

    /// `"{date} {time}"`, repeated on every export row
    pub fn upload_datetime(&self) -> String {
        format!("{} {}", self.upload_date, self.upload_time)
    }
}

/// Definitive failure to fetch one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub video_id: String,
    pub reason: FailureReason,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "video {}: {}", self.video_id, self.reason)
    }
}

/// Parse an ISO-8601 timestamp. A `Z` suffix is UTC; a timestamp without an
/// offset is read as UTC as well.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Split a timestamp into ISO date and ISO time strings.
///
/// The time carries a fractional part (microseconds) only when it is non-zero.
pub fn split_datetime(dt: &DateTime<FixedOffset>) -> (String, String) {
    let date = dt.format("%Y-%m-%d").to_string();
    let time = if dt.nanosecond() / 1_000 == 0 {
        dt.format("%H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", dt.format("%H:%M:%S"), dt.nanosecond() / 1_000)
    };
    (date, time)
}
