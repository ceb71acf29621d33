//! Crawler module for catalog discovery and download
//!
//! This module contains the core crawling logic, including:
//! - Query-key generation over the search alphabet
//! - HTTP fetching with throttling-aware retry
//! - Catalog XML parsing and package extraction
//! - Serialized, cached author resolution
//! - Overall crawl coordination

mod authors;
mod coordinator;
mod fetcher;
mod package;
mod parser;
mod query;

pub use authors::{AuthorResolver, ResolvedAuthor};
pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, FetchResult, Fetcher, RetryPolicy};
pub use package::{extract_text, PackageError, TEXT_EXTENSION};
pub use parser::{
    package_url, parse_person, parse_search_results, person_url, search_url, PersonRecord,
    TextCandidate,
};
pub use query::{QueryKeys, KEY_LENGTH};
