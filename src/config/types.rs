use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default search alphabet: the 28 lowercase letters used by the catalog
pub const DEFAULT_ALPHABET: &str = "абвгдежзийклмнопрстуфхцчшщюя";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub crawler: CrawlerConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// Remote catalog endpoints and HTTP identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL for the search and person endpoints
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Base URL serving `/text/<id>.txt.zip` packages
    #[serde(rename = "download-url")]
    pub download_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://chitanka.info".to_string(),
            download_url: "https://m3.chitanka.info".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Crawl pacing and query space
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Letters combined into 3-letter search keys
    pub alphabet: String,

    /// Pause after each successfully saved text (milliseconds)
    #[serde(rename = "save-delay-ms")]
    pub save_delay_ms: u64,

    /// Pause after each query key (milliseconds)
    #[serde(rename = "key-delay-ms")]
    pub key_delay_ms: u64,

    /// Cool-down held on the author-lookup permit after each lookup (milliseconds)
    #[serde(rename = "author-delay-ms")]
    pub author_delay_ms: u64,

    /// Quota used when the caller does not give one
    #[serde(rename = "default-quota")]
    pub default_quota: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            save_delay_ms: 1500,
            key_delay_ms: 1000,
            author_delay_ms: 500,
            default_quota: 100,
        }
    }
}

impl CrawlerConfig {
    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn author_delay(&self) -> Duration {
        Duration::from_millis(self.author_delay_ms)
    }
}

/// Retry behaviour of the rate-limited fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt, for both throttling and network failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// First backoff after HTTP 429; doubles on every further retry (milliseconds)
    #[serde(rename = "rate-limit-base-ms")]
    pub rate_limit_base_ms: u64,

    /// Fixed delay before retrying a network failure (milliseconds)
    #[serde(rename = "network-retry-ms")]
    pub network_retry_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            rate_limit_base_ms: 5000,
            network_retry_ms: 3000,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Root of the on-disk corpus
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,

    /// Directory (under `data-dir`) holding texts without a resolved author
    #[serde(rename = "unknown-dir")]
    pub unknown_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "chitanka.db".to_string(),
            data_dir: PathBuf::from("./data"),
            unknown_dir: "Unknown".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn unknown_path(&self) -> PathBuf {
        self.data_dir.join(&self.unknown_dir)
    }
}
