//! Application layer
//!
//! Use cases that drive the domain through its service traits: fetching one
//! video, processing one pair and running a whole batch.

pub mod batch_runner;
pub mod pair_processor;
pub mod video_fetcher;

pub use batch_runner::{BatchRunner, Disposition, RowReport, RunSummary};
pub use pair_processor::{PairProcessor, ProcessOutcome};
pub use video_fetcher::{FetchPolicy, VideoFetcher};
