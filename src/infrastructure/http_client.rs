//! Rate-limited HTTP client for the comment service API
//!
//! Requests go out one at a time; the limiter only keeps page loops for long
//! comment threads from hammering the service.

use std::num::NonZeroU32;
use std::time::Duration;
use anyhow::{Context, Result};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::{InMemoryState, direct::NotKeyed}};
use reqwest::{Client, Response, header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT}};
use serde::de::DeserializeOwned;

use crate::infrastructure::config::ServiceConfig;

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl HttpClientConfig {
    pub fn from_service_config(service: &ServiceConfig) -> Self {
        Self {
            user_agent: service.user_agent.clone(),
            timeout_seconds: service.timeout_seconds,
            max_requests_per_second: service.max_requests_per_second,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_service_config(&ServiceConfig::default())
    }
}

/// HTTP client with a direct (unkeyed) rate limiter
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .context("Invalid user agent")?
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// GET a URL; non-success statuses are errors
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("🌐 HTTP GET: {}", url);

        let response = self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "HTTP request failed with status {}: {}",
                response.status(),
                url
            );
        }

        Ok(response)
    }

    /// GET a URL and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        let body = response.text().await
            .with_context(|| format!("Failed to read response body from: {url}"))?;

        serde_json::from_str(&body)
            .with_context(|| format!("Response from {url} is not valid JSON"))
    }
}
