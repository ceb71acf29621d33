//! Storage module for persisting corpus data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Country, author and text identity rows written by the crawler
//! - Text and author statistics written by the analyzer
//! - Aggregate queries used for reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{StorageError, StorageResult, TextStore};

use chrono::NaiveDate;

/// An author awaiting analysis, with the country its files live under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthor {
    pub author_id: i64,
    pub country_name: Option<String>,
}

/// A text belonging to an author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub text_id: i64,
    pub title: String,
    pub unique_word_count: Option<i64>,
}

/// Aggregate statistics for one author
///
/// `None` is stored as NULL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorStats {
    pub avg_words_per_sentence: Option<i64>,
    pub unique_word_count: Option<i64>,
    pub longest_sentence: Option<i64>,
}

/// An author row joined with its country name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorDetails {
    pub author_id: i64,
    pub name: String,
    pub original_name: String,
    pub country_name: Option<String>,
    pub stats: AuthorStats,
    pub last_analyzed: Option<NaiveDate>,
}
