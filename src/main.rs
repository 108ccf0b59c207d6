use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;

use pairwise_comments::application::{BatchRunner, FetchPolicy, PairProcessor, VideoFetcher};
use pairwise_comments::domain::services::{BrowserPrimer, CommentService};
use pairwise_comments::infrastructure::config::ConfigManager;
use pairwise_comments::infrastructure::logging::{init_logging_with_config, log_system_info};
use pairwise_comments::infrastructure::{
    ExportWriter, HadzyApi, HttpClient, HttpClientConfig, RetryQueue, discover_input_file,
    load_pair_rows, primer_from_config,
};

#[derive(Parser)]
#[command(name = "pairwise-comments", version, about = "Export aligned comment tables for pairs of YouTube videos")]
struct Cli {
    /// Input CSV (defaults to the first *.csv in the working directory).
    input: Option<PathBuf>,

    /// Config file path (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let config = config_manager.load_config().await?;

    init_logging_with_config(&config.logging)?;
    log_system_info();
    info!("⚙️ Configuration loaded from {:?}", config_manager.config_path());

    let input = match cli.input {
        Some(path) => path,
        None => discover_input_file(&std::env::current_dir()?, &config.output.retry_queue_path)?
            .ok_or_else(|| anyhow!("No input CSV found in the working directory"))?,
    };
    let rows = load_pair_rows(&input).with_context(|| format!("Failed to load pairs from {input:?}"))?;

    let http = HttpClient::new(HttpClientConfig::from_service_config(&config.service))?;
    let service: Arc<dyn CommentService> = Arc::new(HadzyApi::new(http, &config.service.api_base_url));
    let primer: Arc<dyn BrowserPrimer> =
        Arc::from(primer_from_config(&config.service.front_end_url, &config.browser));

    let fetcher = VideoFetcher::new(service.clone(), primer, FetchPolicy::from(&config.fetch));
    let processor = PairProcessor::new(service, fetcher, config.pairing.min_comment_count);
    let runner = BatchRunner::new(
        processor,
        ExportWriter::new(&config.output.export_dir),
        RetryQueue::new(&config.output.retry_queue_path),
        config.output.retry_pass_enabled,
    );

    let summary = runner.run(&rows).await;
    info!(
        "📊 {} of {} pairs exported ({} after retry), {} skipped, {} dropped, {} failed",
        summary.files_written(),
        summary.total_rows,
        summary.recovered,
        summary.skipped,
        summary.dropped,
        summary.failed
    );
    Ok(())
}
