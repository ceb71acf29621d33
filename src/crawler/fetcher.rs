//! Rate-limited HTTP fetcher
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured identity and timeout
//! - Exponential backoff on HTTP 429
//! - Fixed-delay retry on network failures
//! - Classifying responses for callers that only care about the body

use crate::config::{CatalogConfig, RetryConfig};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Result of fetching a body
#[derive(Debug)]
pub enum FetchResult {
    /// Successful response with its body
    Success {
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: Vec<u8>,
    },

    /// Final response had a non-success status (including 429 after all retries)
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error after all retries (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns the body of a successful fetch
    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            FetchResult::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Retry schedule for the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry after HTTP 429
    pub rate_limit_base: Duration,

    /// Delay before retrying a network failure
    pub network_retry_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            rate_limit_base: Duration::from_millis(config.rate_limit_base_ms),
            network_retry_delay: Duration::from_millis(config.network_retry_ms),
        }
    }

    /// Backoff before retry number `retry` (0-based) after HTTP 429
    ///
    /// `base`, `2 * base`, `4 * base`, ...
    pub fn rate_limit_delay(&self, retry: u32) -> Duration {
        self.rate_limit_base
            .saturating_mul(2u32.saturating_pow(retry))
    }

    /// The full sequence of 429 backoffs for consecutive throttled responses
    pub fn rate_limit_schedule(&self) -> Vec<Duration> {
        (0..self.max_retries)
            .map(|retry| self.rate_limit_delay(retry))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The catalog configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CatalogConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP fetcher with bounded retries
///
/// Every retry reuses the same request; no request is retried more than
/// `max_retries` times.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        catalog: &CatalogConfig,
        retry: &RetryConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(catalog)?,
            RetryPolicy::from_config(retry),
        ))
    }

    /// Sends a GET request, retrying on throttling and network failure
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 429 | Sleep `base * 2^retry`, retry; after `max_retries` return the 429 response |
    /// | Network error | Sleep the fixed delay, retry; after `max_retries` return the error |
    /// | Anything else | Return the response |
    pub async fn fetch(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut retry = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    if retry >= self.policy.max_retries {
                        tracing::warn!(
                            "Rate limited (429) on {} after {} retries, giving up",
                            url,
                            retry
                        );
                        return Ok(response);
                    }

                    let delay = self.policy.rate_limit_delay(retry);
                    tracing::warn!("Rate limited (429) on {}, waiting {:?}", url, delay);
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    if retry >= self.policy.max_retries {
                        return Err(e);
                    }

                    tracing::debug!(
                        "Request to {} failed ({}), retry {}/{}",
                        url,
                        e,
                        retry + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(self.policy.network_retry_delay).await;
                    retry += 1;
                }
            }
        }
    }

    /// Fetches a URL and reads its body, classifying the outcome
    pub async fn fetch_body(&self, url: &str) -> FetchResult {
        let response = match self.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                return FetchResult::NetworkError {
                    error: classify_error(&e),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        match response.bytes().await {
            Ok(body) => FetchResult::Success {
                status_code: status.as_u16(),
                body: body.to_vec(),
            },
            Err(e) => FetchResult::NetworkError {
                error: classify_error(&e),
            },
        }
    }
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
