//! Infrastructure layer for configuration, logging and external integrations
//!
//! HTTP access to the comment service, the Chromium primer and the CSV files
//! the pipeline reads and writes.

pub mod browser_primer;
pub mod comment_api;
pub mod config;
pub mod http_client;
pub mod logging;
pub mod retry_queue;
pub mod tabular;

pub use browser_primer::{ChromiumPrimer, PassthroughPrimer, primer_from_config};
pub use comment_api::HadzyApi;
pub use config::{AppConfig, ConfigManager};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging_with_config};
pub use retry_queue::RetryQueue;
pub use tabular::{ExportWriter, discover_input_file, load_pair_rows};
