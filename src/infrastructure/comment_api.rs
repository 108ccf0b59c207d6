//! Hadzy comment service client
//!
//! Endpoints:
//! - `GET {api}/videos/{id}`: title, publish time and comment count
//! - `GET {api}/videos/{id}?entity=true`: asks the service to process the video
//! - `GET {api}/comments/{id}?page&size&sortBy=publishedAt&direction=asc&searchTerms=&author=`
//!
//! Payloads are read leniently field by field. Only a page without a `content`
//! array, or with a comment whose timestamp cannot be read, counts as malformed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::comment::{Comment, CommentPage, VideoStats, parse_timestamp};
use crate::domain::errors::PageError;
use crate::domain::services::CommentService;
use crate::infrastructure::http_client::HttpClient;

pub struct HadzyApi {
    http: HttpClient,
    base_url: String,
}

impl HadzyApi {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn stats_url(&self, video_id: &str) -> Result<Url> {
        Url::parse(&format!("{}/videos/{}", self.base_url, video_id))
            .context("Invalid statistics URL")
    }

    fn processing_url(&self, video_id: &str) -> Result<Url> {
        let mut url = self.stats_url(video_id)?;
        url.query_pairs_mut().append_pair("entity", "true");
        Ok(url)
    }

    fn comments_url(&self, video_id: &str, page_index: u32, page_size: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/comments/{}", self.base_url, video_id))
            .context("Invalid comments URL")?;
        url.query_pairs_mut()
            .append_pair("page", &page_index.to_string())
            .append_pair("size", &page_size.to_string())
            .append_pair("sortBy", "publishedAt")
            .append_pair("direction", "asc")
            .append_pair("searchTerms", "")
            .append_pair("author", "");
        Ok(url)
    }
}

#[async_trait]
impl CommentService for HadzyApi {
    async fn get_stats(&self, video_id: &str) -> Option<VideoStats> {
        let url = match self.stats_url(video_id) {
            Ok(url) => url,
            Err(e) => {
                warn!("{:#}", e);
                return None;
            }
        };
        match self.http.get_json::<Value>(url.as_str()).await {
            Ok(body) => {
                let stats = parse_stats(video_id, &body);
                if stats.is_none() {
                    warn!(video_id, "Statistics response has no usable item");
                }
                stats
            }
            Err(e) => {
                warn!(video_id, "Statistics request failed: {:#}", e);
                None
            }
        }
    }

    async fn get_page(
        &self,
        video_id: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<CommentPage, PageError> {
        let url = match self.comments_url(video_id, page_index, page_size) {
            Ok(url) => url,
            Err(e) => {
                warn!("{:#}", e);
                return Ok(CommentPage::empty(page_index));
            }
        };
        match self.http.get_json::<Value>(url.as_str()).await {
            Ok(body) => parse_page(video_id, page_index, &body),
            Err(e) => {
                warn!(video_id, page = page_index, "Comment page request failed, treating as empty: {:#}", e);
                Ok(CommentPage::empty(page_index))
            }
        }
    }

    async fn request_processing(&self, video_id: &str) -> bool {
        let Ok(url) = self.processing_url(video_id) else {
            return false;
        };
        match self.http.get(url.as_str()).await {
            Ok(_) => {
                debug!(video_id, "Processing trigger accepted");
                true
            }
            Err(e) => {
                debug!(video_id, "Processing trigger failed: {:#}", e);
                false
            }
        }
    }
}

/// Read a count that may be a number, a numeric string, null or missing.
/// Anything unreadable or negative is 0.
pub fn lenient_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_or(0, |n| n.max(0).unsigned_abs()),
        _ => 0,
    }
}

/// Comment count of a statistics payload; 0 when absent
pub fn comment_count_of(body: &Value) -> u64 {
    lenient_count(body.pointer("/items/0/statistics/commentCount"))
}

/// Decode a statistics payload. Publish time is required; a missing title
/// reads as empty so the comment count still reaches the threshold gate.
pub fn parse_stats(video_id: &str, body: &Value) -> Option<VideoStats> {
    let snippet = body.pointer("/items/0/snippet")?;
    let title = snippet
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let published_at = parse_timestamp(snippet.get("publishedAt")?.as_str()?)?;

    Some(VideoStats {
        video_id: video_id.to_string(),
        title,
        published_at,
        comment_count: comment_count_of(body),
    })
}

/// Decode a comment page
pub fn parse_page(video_id: &str, page_index: u32, body: &Value) -> Result<CommentPage, PageError> {
    let content = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| PageError::malformed(video_id, page_index, "missing 'content' array"))?;

    let total_pages = body
        .pointer("/pageInfo/totalPages")
        .map_or(0, |v| lenient_count(Some(v)));
    let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

    let items = content
        .iter()
        .enumerate()
        .map(|(i, item)| parse_comment(item).ok_or_else(|| {
            PageError::malformed(video_id, page_index, format!("comment {i} has no readable 'publishedAt'"))
        }))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CommentPage {
        items,
        page_index,
        total_pages,
    })
}

fn parse_comment(item: &Value) -> Option<Comment> {
    let text_of = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(Comment {
        published_at: parse_timestamp(item.get("publishedAt")?.as_str()?)?,
        text: text_of("textDisplay"),
        author_name: text_of("authorDisplayName"),
        like_count: lenient_count(item.get("likeCount")),
    })
}
