use crate::config::types::{CatalogConfig, Config, CrawlerConfig, OutputConfig, RetryConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound on fetcher retries; beyond this the backoff runs for hours
const MAX_RETRIES_LIMIT: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates catalog endpoints
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    validate_base_url("base-url", &config.base_url)?;
    validate_base_url("download-url", &config.download_url)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.alphabet.is_empty() {
        return Err(ConfigError::Validation(
            "alphabet cannot be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for letter in config.alphabet.chars() {
        if letter.is_whitespace() {
            return Err(ConfigError::Validation(
                "alphabet cannot contain whitespace".to_string(),
            ));
        }
        if !seen.insert(letter) {
            return Err(ConfigError::Validation(format!(
                "alphabet contains '{}' more than once",
                letter
            )));
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-retries must be at most {}, got {}",
            MAX_RETRIES_LIMIT, config.max_retries
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    if config.unknown_dir.is_empty() || config.unknown_dir.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "unknown-dir must be a single directory name, got '{}'",
            config.unknown_dir
        )));
    }

    Ok(())
}
