//! Error and outcome-reason types shared across the pipeline
//!
//! Component operations report failures as values of these types instead of
//! panicking; only the run loop decides what to log and whether to continue.

use serde::Serialize;
use thiserror::Error;

/// A comment page could be decoded as JSON but did not have the expected shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("page {page} for video {video_id} is malformed: {detail}")]
    Malformed {
        video_id: String,
        page: u32,
        detail: String,
    },
}

impl PageError {
    pub fn malformed(video_id: &str, page: u32, detail: impl Into<String>) -> Self {
        Self::Malformed {
            video_id: video_id.to_string(),
            page,
            detail: detail.into(),
        }
    }
}

/// Why a single video could not be fetched
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// Every priming attempt ended with a probe reporting zero pages
    #[error("cold-cache (no pages after {attempts} priming attempts)")]
    ColdCache { attempts: u32 },

    #[error("malformed-response ({detail})")]
    MalformedResponse { detail: String },

    #[error("stats-unavailable")]
    StatsUnavailable,
}

impl FailureReason {
    /// Short machine-friendly label used in reports and the retry queue log
    pub fn label(&self) -> &'static str {
        match self {
            Self::ColdCache { .. } => "cold-cache",
            Self::MalformedResponse { .. } => "malformed-response",
            Self::StatsUnavailable => "stats-unavailable",
        }
    }
}

/// Which video of a pair a reason refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PairSide {
    A,
    B,
}

impl std::fmt::Display for PairSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Non-retriable reasons for leaving a row out of the export
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[error("no video id in URL for side {side}: '{url}'")]
    InvalidVideoUrl { side: PairSide, url: String },

    #[error("comment counts below threshold (A={count_a}, B={count_b}, minimum={minimum})")]
    BelowThreshold {
        count_a: u64,
        count_b: u64,
        minimum: u64,
    },
}

/// Configuration values that cannot drive a run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("fetch.page_size must be between 1 and {max}, got {value}")]
    PageSizeOutOfRange { value: u32, max: u32 },

    #[error("fetch.max_prime_attempts must be at least 1")]
    NoPrimeAttempts,

    #[error("fetch.max_pages must be at least 1")]
    NoPages,

    #[error("service.max_requests_per_second must be at least 1")]
    ZeroRateLimit,
}
