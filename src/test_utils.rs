//! Test utilities
//!
//! Scripted stand-ins for the comment service and the browser primer, so the
//! orchestration logic can be exercised without network or browser.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;

use crate::domain::comment::{Comment, CommentPage, VideoStats, parse_timestamp};
use crate::domain::errors::PageError;
use crate::domain::services::{BrowserPrimer, CommentService, PrimeStatus};

/// Canned behaviour of one video
#[derive(Debug, Clone)]
pub struct VideoScript {
    pub video_id: String,
    pub title: String,
    pub comments: Vec<Comment>,
    pub comment_count: u64,
    pub reported_total_pages: Option<u32>,
    pub cold_probes: u32,
    pub malformed_page: Option<u32>,
    pub has_stats: bool,
}

impl VideoScript {
    /// `count` comments named `"{title} comment {i}"`, one second apart
    pub fn with_comments(video_id: &str, title: &str, count: usize) -> Self {
        let base = parse_timestamp("2024-01-01T00:00:00Z").expect("valid base timestamp");
        let comments = (0..count)
            .map(|i| Comment {
                text: format!("{title} comment {i}"),
                published_at: base + chrono::Duration::seconds(i as i64),
                author_name: format!("{title} author {i}"),
                like_count: (i % 7) as u64,
            })
            .collect();
        Self {
            video_id: video_id.to_string(),
            title: title.to_string(),
            comments,
            comment_count: count as u64,
            reported_total_pages: None,
            cold_probes: 0,
            malformed_page: None,
            has_stats: true,
        }
    }

    /// The first `n` page-0 probes come back with zero pages
    pub fn cold_probes(mut self, n: u32) -> Self {
        self.cold_probes = n;
        self
    }

    pub fn reported_total_pages(mut self, total: u32) -> Self {
        self.reported_total_pages = Some(total);
        self
    }

    pub fn malformed_page(mut self, page: u32) -> Self {
        self.malformed_page = Some(page);
        self
    }

    pub fn without_stats(mut self) -> Self {
        self.has_stats = false;
        self
    }

    /// Override the comment count the statistics endpoint reports
    pub fn comment_count(mut self, count: u64) -> Self {
        self.comment_count = count;
        self
    }

    fn stats(&self) -> VideoStats {
        VideoStats {
            video_id: self.video_id.clone(),
            title: self.title.clone(),
            published_at: parse_timestamp("2023-12-31T08:00:00Z").expect("valid upload timestamp"),
            comment_count: self.comment_count,
        }
    }
}

/// In-memory comment service that records every page request
#[derive(Default)]
pub struct ScriptedService {
    videos: Mutex<HashMap<String, VideoScript>>,
    page_log: Mutex<Vec<(String, u32)>>,
    processing_requests: AtomicU32,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_video(&self, script: VideoScript) {
        self.videos
            .lock()
            .unwrap()
            .insert(script.video_id.clone(), script);
    }

    /// Page indices requested for a video, in request order
    pub fn page_requests(&self, video_id: &str) -> Vec<u32> {
        self.page_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == video_id)
            .map(|(_, page)| *page)
            .collect()
    }

    pub fn processing_requests(&self) -> u32 {
        self.processing_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentService for ScriptedService {
    async fn get_stats(&self, video_id: &str) -> Option<VideoStats> {
        let videos = self.videos.lock().unwrap();
        videos
            .get(video_id)
            .filter(|script| script.has_stats)
            .map(VideoScript::stats)
    }

    async fn get_page(
        &self,
        video_id: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<CommentPage, PageError> {
        self.page_log
            .lock()
            .unwrap()
            .push((video_id.to_string(), page_index));

        let mut videos = self.videos.lock().unwrap();
        let Some(script) = videos.get_mut(video_id) else {
            return Ok(CommentPage::empty(page_index));
        };

        if page_index == 0 && script.cold_probes > 0 {
            script.cold_probes -= 1;
            return Ok(CommentPage::empty(page_index));
        }
        if script.malformed_page == Some(page_index) {
            return Err(PageError::malformed(video_id, page_index, "missing 'content' array"));
        }

        let size = page_size as usize;
        let total_pages = script
            .reported_total_pages
            .unwrap_or_else(|| script.comments.len().div_ceil(size) as u32);
        let items = script
            .comments
            .iter()
            .skip(page_index as usize * size)
            .take(size)
            .cloned()
            .collect();

        Ok(CommentPage {
            items,
            page_index,
            total_pages,
        })
    }

    async fn request_processing(&self, _video_id: &str) -> bool {
        self.processing_requests.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// Primer returning a fixed status and counting calls
pub struct ScriptedPrimer {
    status: PrimeStatus,
    calls: AtomicU32,
}

impl ScriptedPrimer {
    pub fn ready() -> Self {
        Self { status: PrimeStatus::Ready, calls: AtomicU32::new(0) }
    }

    pub fn not_ready() -> Self {
        Self { status: PrimeStatus::NotReady, calls: AtomicU32::new(0) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserPrimer for ScriptedPrimer {
    async fn prime(&self, _video_link: &str) -> PrimeStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status
    }
}
