//! Video fetch orchestrator
//!
//! Produces the complete, ordered comment list for one video:
//!
//! 1. prime the service and probe page 0 for the page count, up to
//!    `max_prime_attempts` times while the probe comes back cold
//! 2. page through `0..=min(total_pages, max_pages)`, reusing the probe as page 0
//! 3. attach title and upload time from the statistics endpoint
//!
//! The page count is read once per attempt and not revalidated while paging.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::comment::{Comment, CommentPage, FetchFailure, VideoResult};
use crate::domain::errors::{FailureReason, PageError};
use crate::domain::services::{BrowserPrimer, CommentService};
use crate::infrastructure::config::FetchConfig;

/// Fetch policy, decoupled from the on-disk config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    pub page_size: u32,
    pub max_pages: u32,
    pub max_prime_attempts: u32,
    pub request_entity_processing: bool,
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
            max_prime_attempts: config.max_prime_attempts,
            request_entity_processing: config.request_entity_processing,
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

pub struct VideoFetcher {
    service: Arc<dyn CommentService>,
    primer: Arc<dyn BrowserPrimer>,
    policy: FetchPolicy,
}

impl VideoFetcher {
    pub fn new(
        service: Arc<dyn CommentService>,
        primer: Arc<dyn BrowserPrimer>,
        policy: FetchPolicy,
    ) -> Self {
        Self { service, primer, policy }
    }

    /// Fetch every comment of one video, or report why that was impossible
    pub async fn fetch(&self, video_id: &str, video_link: &str) -> Result<VideoResult, FetchFailure> {
        let failure = |reason| FetchFailure {
            video_id: video_id.to_string(),
            reason,
        };

        let first_page = self
            .warm_probe(video_id, video_link)
            .await
            .map_err(|e| failure(malformed(&e)))?
            .ok_or_else(|| failure(FailureReason::ColdCache {
                attempts: self.policy.max_prime_attempts,
            }))?;

        let comments = self
            .paginate(video_id, first_page)
            .await
            .map_err(|e| failure(malformed(&e)))?;

        let stats = self
            .service
            .get_stats(video_id)
            .await
            .ok_or_else(|| failure(FailureReason::StatsUnavailable))?;

        info!(video_id, comments = comments.len(), "✅ Video fetched: {}", stats.title);
        Ok(VideoResult::from_stats(&stats, comments))
    }

    /// Prime and probe until page 0 reports pages. `Ok(None)` means every
    /// attempt stayed cold.
    async fn warm_probe(&self, video_id: &str, video_link: &str) -> Result<Option<CommentPage>, PageError> {
        for attempt in 1..=self.policy.max_prime_attempts {
            let status = self.primer.prime(video_link).await;
            if !status.is_ready() {
                warn!(video_id, attempt, "Primer did not report ready, probing anyway");
            }

            if self.policy.request_entity_processing {
                self.service.request_processing(video_id).await;
            }

            let probe = self.service.get_page(video_id, 0, self.policy.page_size).await?;
            if !probe.is_cold() {
                debug!(video_id, attempt, total_pages = probe.total_pages, "Probe warm");
                return Ok(Some(probe));
            }

            warn!(
                video_id,
                attempt,
                max_attempts = self.policy.max_prime_attempts,
                "🧊 Probe reported zero pages"
            );
        }
        Ok(None)
    }

    /// Collect pages `0..=min(total_pages, max_pages)` in order
    async fn paginate(&self, video_id: &str, first_page: CommentPage) -> Result<Vec<Comment>, PageError> {
        let last_page = first_page.total_pages.min(self.policy.max_pages);
        if first_page.total_pages > self.policy.max_pages {
            warn!(
                video_id,
                reported = first_page.total_pages,
                cap = self.policy.max_pages,
                "Page count exceeds cap, truncating"
            );
        }

        let mut comments = first_page.items;
        for page_index in 1..=last_page {
            let page = self.service.get_page(video_id, page_index, self.policy.page_size).await?;
            debug!(video_id, page = page.page_index, items = page.items.len(), "Page fetched");
            comments.extend(page.items);
        }
        Ok(comments)
    }
}

fn malformed(error: &PageError) -> FailureReason {
    FailureReason::MalformedResponse {
        detail: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedPrimer, ScriptedService, VideoScript};

    fn fetcher(service: &Arc<ScriptedService>, primer: &Arc<ScriptedPrimer>) -> VideoFetcher {
        VideoFetcher::new(service.clone(), primer.clone(), FetchPolicy::default())
    }

    #[tokio::test]
    async fn test_fetch_pages_through_all_pages() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 120));
        let primer = Arc::new(ScriptedPrimer::ready());

        let result = fetcher(&service, &primer).fetch("aaaaaaaaaaa", "link-a").await.unwrap();

        assert_eq!(result.comments.len(), 120);
        assert_eq!(result.title, "Alpha");
        assert_eq!(result.comments[0].text, "Alpha comment 0");
        assert_eq!(result.comments[119].text, "Alpha comment 119");
        // 3 pages reported: probe (page 0) + pages 1..=3
        assert_eq!(service.page_requests("aaaaaaaaaaa"), vec![0, 1, 2, 3]);
        assert_eq!(primer.calls(), 1);
    }

    #[tokio::test]
    async fn test_cold_then_warm_uses_second_attempt() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 130).cold_probes(1));
        let primer = Arc::new(ScriptedPrimer::ready());

        let result = fetcher(&service, &primer).fetch("aaaaaaaaaaa", "link-a").await.unwrap();

        assert_eq!(result.comments.len(), 130);
        assert_eq!(primer.calls(), 2);
        assert_eq!(service.page_requests("aaaaaaaaaaa"), vec![0, 0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cold_twice_is_a_failure_without_paging() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 130).cold_probes(2));
        let primer = Arc::new(ScriptedPrimer::ready());

        let failure = fetcher(&service, &primer).fetch("aaaaaaaaaaa", "link-a").await.unwrap_err();

        assert_eq!(failure.reason, FailureReason::ColdCache { attempts: 2 });
        assert_eq!(service.page_requests("aaaaaaaaaaa"), vec![0, 0]);
        assert_eq!(primer.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_ready_primer_counts_as_attempt() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 10).cold_probes(2));
        let primer = Arc::new(ScriptedPrimer::not_ready());

        let failure = fetcher(&service, &primer).fetch("aaaaaaaaaaa", "link-a").await.unwrap_err();
        assert_eq!(failure.reason.label(), "cold-cache");
        assert_eq!(primer.calls(), 2);
    }

    #[tokio::test]
    async fn test_page_cap_bounds_requests() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 40).reported_total_pages(5000));
        let primer = Arc::new(ScriptedPrimer::ready());
        let policy = FetchPolicy {
            page_size: 5,
            max_pages: 20,
            ..FetchPolicy::default()
        };

        let result = VideoFetcher::new(service.clone(), primer, policy)
            .fetch("aaaaaaaaaaa", "link-a")
            .await
            .unwrap();

        assert_eq!(service.page_requests("aaaaaaaaaaa").len(), 21);
        assert_eq!(result.comments.len(), 40);
    }

    #[tokio::test]
    async fn test_malformed_page_fails_without_retry() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 120).malformed_page(2));
        let primer = Arc::new(ScriptedPrimer::ready());

        let failure = fetcher(&service, &primer).fetch("aaaaaaaaaaa", "link-a").await.unwrap_err();

        assert_eq!(failure.reason.label(), "malformed-response");
        assert_eq!(service.page_requests("aaaaaaaaaaa"), vec![0, 1, 2]);
        assert_eq!(primer.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_stats_fails_fetch() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 10).without_stats());
        let primer = Arc::new(ScriptedPrimer::ready());

        let failure = fetcher(&service, &primer).fetch("aaaaaaaaaaa", "link-a").await.unwrap_err();
        assert_eq!(failure.reason, FailureReason::StatsUnavailable);
    }

    #[tokio::test]
    async fn test_processing_trigger_follows_policy() {
        let service = Arc::new(ScriptedService::new());
        service.add_video(VideoScript::with_comments("aaaaaaaaaaa", "Alpha", 10));
        let primer = Arc::new(ScriptedPrimer::ready());
        let policy = FetchPolicy {
            request_entity_processing: false,
            ..FetchPolicy::default()
        };

        VideoFetcher::new(service.clone(), primer, policy)
            .fetch("aaaaaaaaaaa", "link-a")
            .await
            .unwrap();
        assert_eq!(service.processing_requests(), 0);
    }
}
