//! Storage traits and error types
//!
//! This module defines the trait interface for the text store and
//! associated error types.

use crate::storage::{AuthorDetails, AuthorStats, PendingAuthor, TextRecord};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid date in column {column}: {value}")]
    InvalidDate { column: &'static str, value: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for text store implementations
///
/// The crawler writes identity rows (countries, authors, texts) through this
/// trait and the analyzer writes computed statistics. The two never write the
/// same columns.
pub trait TextStore {
    // ===== Crawl-side identity =====

    /// Returns every text ID currently known to the store
    fn list_known_text_ids(&self) -> StorageResult<HashSet<i64>>;

    /// Inserts the country if needed and returns its ID
    fn find_or_create_country(&mut self, name: &str) -> StorageResult<i64>;

    /// Inserts or updates an author's identity fields
    fn upsert_author(
        &mut self,
        author_id: i64,
        name: &str,
        original_name: &str,
        country_id: Option<i64>,
    ) -> StorageResult<()>;

    /// Inserts or updates a text's identity fields
    fn upsert_text(&mut self, text_id: i64, title: &str, author_id: Option<i64>)
        -> StorageResult<()>;

    // ===== Analysis =====

    /// Lists authors owning at least one text whose statistics were not
    /// refreshed on `today`
    fn list_authors_pending_analysis(&self, today: NaiveDate)
        -> StorageResult<Vec<PendingAuthor>>;

    /// Lists every text belonging to an author
    fn list_texts_for_author(&self, author_id: i64) -> StorageResult<Vec<TextRecord>>;

    /// Looks up a text's word count
    ///
    /// Returns `None` if the text does not exist, `Some(None)` if it exists
    /// but has not been analyzed.
    fn text_word_count(&self, text_id: i64) -> StorageResult<Option<Option<i64>>>;

    /// Records a text's unique word count; returns false if no such text exists
    fn update_text_word_count(
        &mut self,
        text_id: i64,
        count: i64,
        analyzed_on: NaiveDate,
    ) -> StorageResult<bool>;

    /// Records an author's aggregate statistics and stamps the analysis date
    fn update_author_stats(
        &mut self,
        author_id: i64,
        stats: &AuthorStats,
        analyzed_on: NaiveDate,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts all texts
    fn count_texts(&self) -> StorageResult<u64>;

    /// Sums the unique word counts of all analyzed texts
    fn sum_text_unique_words(&self) -> StorageResult<u64>;

    /// Counts distinct authors referenced by at least one text
    fn count_attributed_authors(&self) -> StorageResult<u64>;

    /// Counts distinct authors referenced by texts whose author has statistics
    fn count_analyzed_authors(&self) -> StorageResult<u64>;

    /// Returns authors ordered by unique word count (descending, unanalyzed last)
    fn top_authors(&self, limit: usize) -> StorageResult<Vec<AuthorDetails>>;

    /// Fetches one author with country name and statistics
    fn get_author(&self, author_id: i64) -> StorageResult<Option<AuthorDetails>>;
}
