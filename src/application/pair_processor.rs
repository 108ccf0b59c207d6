//! Pair processor
//!
//! Turns one input row into exactly one outcome: an aligned table ready for
//! export, a deferral carrying the fetch failure, or a skip. Rows that are
//! skipped here are never retried.

use std::sync::Arc;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::video_fetcher::VideoFetcher;
use crate::domain::comment::FetchFailure;
use crate::domain::errors::{PairSide, SkipReason};
use crate::domain::merge::{AlignedTable, merge_results};
use crate::domain::pair_row::PairRow;
use crate::domain::services::CommentService;
use crate::domain::video_ref::VideoRef;

/// What happened to one pair row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProcessOutcome {
    Exported(AlignedTable),
    Deferred(FetchFailure),
    Skipped(SkipReason),
}

pub struct PairProcessor {
    service: Arc<dyn CommentService>,
    fetcher: VideoFetcher,
    min_comment_count: u64,
}

impl PairProcessor {
    pub fn new(service: Arc<dyn CommentService>, fetcher: VideoFetcher, min_comment_count: u64) -> Self {
        Self {
            service,
            fetcher,
            min_comment_count,
        }
    }

    pub async fn process(&self, row: &PairRow) -> ProcessOutcome {
        let row_no = row.index + 1;

        let (id_a, id_b) = match (row.video_a.id(), row.video_b.id()) {
            (Some(a), Some(b)) => (a, b),
            (None, _) => return self.skip(row_no, invalid_url(PairSide::A, &row.video_a)),
            (_, None) => return self.skip(row_no, invalid_url(PairSide::B, &row.video_b)),
        };

        let count_a = self.comment_count(id_a).await;
        let count_b = self.comment_count(id_b).await;
        if count_a < self.min_comment_count || count_b < self.min_comment_count {
            return self.skip(
                row_no,
                SkipReason::BelowThreshold {
                    count_a,
                    count_b,
                    minimum: self.min_comment_count,
                },
            );
        }

        info!(row = row_no, video_a = %row.video_a, video_b = %row.video_b, count_a, count_b, "🎬 Processing pair");

        let result_a = match self.fetcher.fetch(id_a, &row.video_a.raw_url).await {
            Ok(result) => result,
            Err(failure) => return defer(row_no, failure),
        };
        let result_b = match self.fetcher.fetch(id_b, &row.video_b.raw_url).await {
            Ok(result) => result,
            Err(failure) => return defer(row_no, failure),
        };

        let table = merge_results(&result_a, &result_b);
        info!(
            row = row_no,
            rows = table.len(),
            comments_a = result_a.comments.len(),
            comments_b = result_b.comments.len(),
            "🔗 Pair merged"
        );
        ProcessOutcome::Exported(table)
    }

    /// Missing statistics count as zero comments
    async fn comment_count(&self, video_id: &str) -> u64 {
        match self.service.get_stats(video_id).await {
            Some(stats) => stats.comment_count,
            None => {
                warn!(video_id, "Statistics unavailable, treating comment count as 0");
                0
            }
        }
    }

    fn skip(&self, row_no: usize, reason: SkipReason) -> ProcessOutcome {
        info!(row = row_no, "⏭️ Row skipped: {}", reason);
        ProcessOutcome::Skipped(reason)
    }
}

fn invalid_url(side: PairSide, video: &VideoRef) -> SkipReason {
    SkipReason::InvalidVideoUrl {
        side,
        url: video.raw_url.clone(),
    }
}

fn defer(row_no: usize, failure: FetchFailure) -> ProcessOutcome {
    warn!(row = row_no, video_id = %failure.video_id, reason = failure.reason.label(), "⏸️ Row deferred: {}", failure);
    ProcessOutcome::Deferred(failure)
}
