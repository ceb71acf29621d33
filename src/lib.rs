//! Chitanka corpus: a polite text harvester and corpus analyzer
//!
//! This crate crawls a keyword-searchable literary catalog, downloads texts
//! and author metadata into a local corpus, and computes per-text and
//! per-author language statistics over the stored files.

pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for corpus operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Author not found: {0}")]
    AuthorNotFound(i64),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analyzer::{run_analysis, AnalysisReport};
pub use config::Config;
pub use crawler::{run_crawl, CrawlReport};
pub use state::CrawlState;
pub use storage::{SqliteStorage, TextStore};
