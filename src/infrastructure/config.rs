//! Configuration infrastructure
//!
//! Settings live in a single JSON file. Every section falls back to its
//! defaults when absent, so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::errors::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Comment service endpoints and HTTP behaviour
    pub service: ServiceConfig,

    /// Per-video fetch policy
    pub fetch: FetchConfig,

    /// Pair acceptance rules
    pub pairing: PairingConfig,

    /// Browser primer settings
    pub browser: BrowserConfig,

    /// Export and retry-queue locations
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the JSON API, without trailing slash
    pub api_base_url: String,

    /// Web front end used for priming
    pub front_end_url: String,

    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    pub max_requests_per_second: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Comments per page request (service maximum is 100)
    pub page_size: u32,

    /// Hard cap on pages fetched per video regardless of the reported total
    pub max_pages: u32,

    /// Priming + probe attempts before a video is declared cold
    pub max_prime_attempts: u32,

    /// Call the service's processing trigger after each priming
    pub request_entity_processing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Both videos need at least this many comments
    pub min_comment_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// When false, priming always reports ready without launching a browser
    pub enabled: bool,

    pub headless: bool,

    /// Chrome/Chromium binary; auto-detected when unset
    pub executable_path: Option<PathBuf>,

    pub search_input_selector: String,

    pub submit_selector: String,

    /// Control that appears once the service has the video loaded
    pub view_comments_selector: String,

    /// Bounded wait for each UI element, in seconds
    pub element_timeout_seconds: u64,

    /// Pause after each UI action so client-side rendering can settle
    pub settle_pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one CSV per exported pair
    pub export_dir: PathBuf,

    /// CSV store for deferred rows
    pub retry_queue_path: PathBuf,

    /// Run the single deferred pass over the retry queue
    pub retry_pass_enabled: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; defaults to `logs/` next to the working directory
    pub log_dir: Option<PathBuf>,

    pub file_name: String,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::API_BASE_URL.to_string(),
            front_end_url: defaults::FRONT_END_URL.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            max_pages: defaults::MAX_PAGES,
            max_prime_attempts: defaults::MAX_PRIME_ATTEMPTS,
            request_entity_processing: defaults::REQUEST_ENTITY_PROCESSING,
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            min_comment_count: defaults::MIN_COMMENT_COUNT,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            executable_path: None,
            search_input_selector: defaults::SEARCH_INPUT_SELECTOR.to_string(),
            submit_selector: defaults::SUBMIT_SELECTOR.to_string(),
            view_comments_selector: defaults::VIEW_COMMENTS_SELECTOR.to_string(),
            element_timeout_seconds: defaults::ELEMENT_TIMEOUT_SECONDS,
            settle_pause_ms: defaults::SETTLE_PAUSE_MS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from(defaults::EXPORT_DIR),
            retry_queue_path: PathBuf::from(defaults::RETRY_QUEUE_FILE),
            retry_pass_enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: true,
            file_output: true,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Reject values no run can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.page_size == 0 || self.fetch.page_size > defaults::SERVICE_MAX_PAGE_SIZE {
            return Err(ConfigError::PageSizeOutOfRange {
                value: self.fetch.page_size,
                max: defaults::SERVICE_MAX_PAGE_SIZE,
            });
        }
        if self.fetch.max_prime_attempts == 0 {
            return Err(ConfigError::NoPrimeAttempts);
        }
        if self.fetch.max_pages == 0 {
            return Err(ConfigError::NoPages);
        }
        if self.service.max_requests_per_second == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        Ok(())
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the per-user default location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Manager for an explicit config file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { config_path: path.into() }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path).await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let config = match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                config
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file is not valid: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config).await
                    .context("Failed to save default configuration")?;
                default_config
            }
        };

        config.validate()
            .with_context(|| format!("Invalid configuration in {:?}", self.config_path))?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config)
            .context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content).await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "pairwise-comments";
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Comment service JSON API
    pub const API_BASE_URL: &str = "https://www.hadzy.com/api";

    /// Comment service web front end
    pub const FRONT_END_URL: &str = "https://www.hadzy.com/";

    pub const USER_AGENT: &str = "pairwise-comments/0.3 (Research Tool)";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

    pub const PAGE_SIZE: u32 = 50;

    /// Largest page size the service accepts
    pub const SERVICE_MAX_PAGE_SIZE: u32 = 100;

    pub const MAX_PAGES: u32 = 1000;
    pub const MAX_PRIME_ATTEMPTS: u32 = 2;
    pub const REQUEST_ENTITY_PROCESSING: bool = true;

    pub const MIN_COMMENT_COUNT: u64 = 50;

    pub const SEARCH_INPUT_SELECTOR: &str = "input[type='text']";
    pub const SUBMIT_SELECTOR: &str = "button[type='submit']";
    pub const VIEW_COMMENTS_SELECTOR: &str = "a[href*='comments']";
    pub const ELEMENT_TIMEOUT_SECONDS: u64 = 30;
    pub const SETTLE_PAUSE_MS: u64 = 3000;

    pub const EXPORT_DIR: &str = "exports";
    pub const RETRY_QUEUE_FILE: &str = "retry_queue.csv";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_NAME: &str = "pairwise-comments.log";
}
