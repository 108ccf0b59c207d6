//! Service seams the pipeline depends on
//!
//! The fetch orchestrator only sees these traits, so the HTTP client and the
//! browser driver can be swapped for scripted stubs in tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::comment::{CommentPage, VideoStats};
use crate::domain::errors::PageError;

/// Comment-aggregation service (statistics + paginated comments)
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Video metadata; `None` on any network or decoding failure
    async fn get_stats(&self, video_id: &str) -> Option<VideoStats>;

    /// One page of comments. Transport failures come back as an empty page;
    /// only a structurally wrong payload is an error.
    async fn get_page(
        &self,
        video_id: &str,
        page_index: u32,
        page_size: u32,
    ) -> Result<CommentPage, PageError>;

    /// Ask the service to (re)process a video. Best-effort.
    async fn request_processing(&self, video_id: &str) -> bool;
}

/// Result of one priming call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimeStatus {
    Ready,
    NotReady,
}

impl PrimeStatus {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Warms the service's backend cache for a video through its web front end
#[async_trait]
pub trait BrowserPrimer: Send + Sync {
    async fn prime(&self, video_link: &str) -> PrimeStatus;
}
