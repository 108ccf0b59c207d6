//! Browser primers
//!
//! The comment service only serves a video's comments through its API after
//! someone has looked the video up on its web front end. [`ChromiumPrimer`]
//! does that lookup in a headless Chromium session; [`PassthroughPrimer`] is
//! used when priming is switched off.

use std::time::{Duration, Instant};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::services::{BrowserPrimer, PrimeStatus};
use crate::infrastructure::config::BrowserConfig;

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Drives the service's search UI in a short-lived Chromium session
pub struct ChromiumPrimer {
    front_end_url: String,
    settings: BrowserConfig,
}

impl ChromiumPrimer {
    pub fn new(front_end_url: &str, settings: BrowserConfig) -> Self {
        Self {
            front_end_url: front_end_url.to_string(),
            settings,
        }
    }

    fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.element_timeout_seconds)
    }

    fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settings.settle_pause_ms)
    }

    /// Start the browser and the task pumping its CDP event stream
    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        let mut builder = ChromeConfig::builder()
            .request_timeout(self.element_timeout());
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.settings.executable_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handler_task))
    }

    /// Search for the video and open its comments view
    async fn run_priming(&self, browser: &Browser, video_link: &str) -> Result<()> {
        let page = browser
            .new_page(self.front_end_url.as_str())
            .await
            .with_context(|| format!("Failed to open {}", self.front_end_url))?;

        let search = self
            .wait_for_element(&page, &self.settings.search_input_selector)
            .await?;
        search.click().await.context("Failed to focus search input")?;
        search.type_str(video_link).await.context("Failed to type video link")?;

        let submit = self
            .wait_for_element(&page, &self.settings.submit_selector)
            .await?;
        submit.click().await.context("Failed to submit search")?;
        sleep(self.settle_pause()).await;

        let view_comments = self
            .wait_for_element(&page, &self.settings.view_comments_selector)
            .await?;
        view_comments.click().await.context("Failed to open comments view")?;
        sleep(self.settle_pause()).await;

        Ok(())
    }

    /// Poll for a selector until it appears or the per-step timeout elapses
    async fn wait_for_element(&self, page: &Page, selector: &str) -> Result<Element> {
        let deadline = Instant::now() + self.element_timeout();
        loop {
            match page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(e) if Instant::now() >= deadline => {
                    return Err(anyhow!(
                        "'{}' did not appear within {:?}: {}",
                        selector,
                        self.element_timeout(),
                        e
                    ));
                }
                Err(_) => sleep(ELEMENT_POLL_INTERVAL).await,
            }
        }
    }
}

#[async_trait]
impl BrowserPrimer for ChromiumPrimer {
    async fn prime(&self, video_link: &str) -> PrimeStatus {
        info!("🌐 Priming comment service for {}", video_link);

        let (mut browser, handler_task) = match self.launch().await {
            Ok(session) => session,
            Err(e) => {
                warn!("❌ Priming not possible: {:#}", e);
                return PrimeStatus::NotReady;
            }
        };

        let outcome = self.run_priming(&browser, video_link).await;

        // The session is torn down whatever happened above.
        if let Err(e) = browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        if let Err(e) = browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        handler_task.abort();

        match outcome {
            Ok(()) => {
                info!("✅ Priming completed for {}", video_link);
                PrimeStatus::Ready
            }
            Err(e) => {
                warn!("⚠️ Priming failed for {}: {:#}", video_link, e);
                PrimeStatus::NotReady
            }
        }
    }
}

/// Reports ready without doing anything
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughPrimer;

#[async_trait]
impl BrowserPrimer for PassthroughPrimer {
    async fn prime(&self, video_link: &str) -> PrimeStatus {
        debug!("Priming disabled, skipping browser for {}", video_link);
        PrimeStatus::Ready
    }
}

/// Pick the primer the configuration asks for
pub fn primer_from_config(front_end_url: &str, settings: &BrowserConfig) -> Box<dyn BrowserPrimer> {
    if settings.enabled {
        Box::new(ChromiumPrimer::new(front_end_url, settings.clone()))
    } else {
        Box::new(PassthroughPrimer)
    }
}
