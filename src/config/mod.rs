//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the defaults used
//! against the public catalog.
//!
//! # Example
//!
//! ```no_run
//! use chitanka_corpus::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("corpus.toml")).unwrap();
//! println!("Corpus root: {}", config.output.data_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, CrawlerConfig, OutputConfig, RetryConfig, DEFAULT_ALPHABET,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default};
pub use validation::validate;
