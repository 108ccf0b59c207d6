//! Pairwise Comments - side-by-side YouTube comment exports
//!
//! Reads a table of video pairs, pulls every comment of both videos from the
//! Hadzy comment service and writes one positionally aligned CSV per pair.
//! Pairs whose videos are not yet cached by the service are retried once at
//! the end of the run.

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_utils;

pub use application::{BatchRunner, PairProcessor, RunSummary, VideoFetcher};
pub use domain::{AlignedTable, PairRow, extract_video_id, merge_results};
