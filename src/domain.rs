//! Domain module - comment records, pair rows and the service seams
//!
//! Nothing in here performs I/O. The application layer drives these types
//! through the traits in [`services`].

pub mod comment;
pub mod errors;
pub mod merge;
pub mod pair_row;
pub mod services;
pub mod video_ref;

pub use comment::{Comment, CommentPage, FetchFailure, VideoResult, VideoStats};
pub use errors::{ConfigError, FailureReason, PageError, PairSide, SkipReason};
pub use merge::{AlignedTable, merge_results};
pub use pair_row::{PairRow, RawRow};
pub use services::{BrowserPrimer, CommentService, PrimeStatus};
pub use video_ref::{VideoRef, extract_video_id};
