//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the TextStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, TextStore};
use crate::storage::{AuthorDetails, AuthorStats, PendingAuthor, TextRecord};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const AUTHOR_DETAILS_SQL: &str = "SELECT a.author_id, a.author_name, a.original_name, c.country_name,
        a.words_per_sentence, a.unique_word_count, a.longest_sentence, a.last_analyzed
     FROM authors a
     LEFT JOIN countries c ON a.country_id = c.country_id";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Direct access to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(column: &'static str, value: Option<String>) -> StorageResult<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, DATE_FORMAT)
                .map_err(|_| StorageError::InvalidDate { column, value: v })
        })
        .transpose()
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Maps a row from `AUTHOR_DETAILS_SQL`; the date column is returned raw
fn author_details_from_row(row: &Row<'_>) -> rusqlite::Result<(AuthorDetails, Option<String>)> {
    Ok((
        AuthorDetails {
            author_id: row.get(0)?,
            name: row.get(1)?,
            original_name: row.get(2)?,
            country_name: row.get(3)?,
            stats: AuthorStats {
                avg_words_per_sentence: row.get(4)?,
                unique_word_count: row.get(5)?,
                longest_sentence: row.get(6)?,
            },
            last_analyzed: None,
        },
        row.get(7)?,
    ))
}

fn finish_author_details(
    (mut details, raw_date): (AuthorDetails, Option<String>),
) -> StorageResult<AuthorDetails> {
    details.last_analyzed = parse_date("authors.last_analyzed", raw_date)?;
    Ok(details)
}

impl TextStore for SqliteStorage {
    // ===== Crawl-side identity =====

    fn list_known_text_ids(&self) -> StorageResult<HashSet<i64>> {
        let mut stmt = self.conn.prepare("SELECT text_id FROM texts")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    fn find_or_create_country(&mut self, name: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO countries (country_name) VALUES (?1)
             ON CONFLICT(country_name) DO NOTHING",
            params![name],
        )?;

        let id = self.conn.query_row(
            "SELECT country_id FROM countries WHERE country_name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_author(
        &mut self,
        author_id: i64,
        name: &str,
        original_name: &str,
        country_id: Option<i64>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO authors (author_id, author_name, original_name, country_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(author_id) DO UPDATE SET
                author_name = excluded.author_name,
                original_name = excluded.original_name,
                country_id = excluded.country_id",
            params![author_id, name, original_name, country_id],
        )?;
        Ok(())
    }

    fn upsert_text(
        &mut self,
        text_id: i64,
        title: &str,
        author_id: Option<i64>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO texts (text_id, title, author_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(text_id) DO UPDATE SET
                title = excluded.title,
                author_id = excluded.author_id",
            params![text_id, title, author_id],
        )?;
        Ok(())
    }

    // ===== Analysis =====

    fn list_authors_pending_analysis(
        &self,
        today: NaiveDate,
    ) -> StorageResult<Vec<PendingAuthor>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT a.author_id, c.country_name
             FROM authors a
             JOIN texts t ON a.author_id = t.author_id
             LEFT JOIN countries c ON a.country_id = c.country_id
             WHERE a.last_analyzed IS NOT ?1",
        )?;

        let authors = stmt
            .query_map(params![format_date(today)], |row| {
                Ok(PendingAuthor {
                    author_id: row.get(0)?,
                    country_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(authors)
    }

    fn list_texts_for_author(&self, author_id: i64) -> StorageResult<Vec<TextRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT text_id, title, unique_word_count FROM texts
             WHERE author_id = ?1 ORDER BY text_id",
        )?;

        let texts = stmt
            .query_map(params![author_id], |row| {
                Ok(TextRecord {
                    text_id: row.get(0)?,
                    title: row.get(1)?,
                    unique_word_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(texts)
    }

    fn text_word_count(&self, text_id: i64) -> StorageResult<Option<Option<i64>>> {
        let count = self
            .conn
            .query_row(
                "SELECT unique_word_count FROM texts WHERE text_id = ?1",
                params![text_id],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;
        Ok(count)
    }

    fn update_text_word_count(
        &mut self,
        text_id: i64,
        count: i64,
        analyzed_on: NaiveDate,
    ) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE texts SET unique_word_count = ?1, last_analyzed = ?2 WHERE text_id = ?3",
            params![count, format_date(analyzed_on), text_id],
        )?;
        Ok(changed > 0)
    }

    fn update_author_stats(
        &mut self,
        author_id: i64,
        stats: &AuthorStats,
        analyzed_on: NaiveDate,
    ) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE authors SET
                words_per_sentence = ?1,
                unique_word_count = ?2,
                longest_sentence = ?3,
                last_analyzed = ?4
             WHERE author_id = ?5",
            params![
                stats.avg_words_per_sentence,
                stats.unique_word_count,
                stats.longest_sentence,
                format_date(analyzed_on),
                author_id
            ],
        )?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_texts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM texts", [], |row| row.get(0))?;
        Ok(to_count(count))
    }

    fn sum_text_unique_words(&self) -> StorageResult<u64> {
        let sum: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(unique_word_count), 0) FROM texts
             WHERE unique_word_count IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(to_count(sum))
    }

    fn count_attributed_authors(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT author_id) FROM texts WHERE author_id IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(to_count(count))
    }

    fn count_analyzed_authors(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT author_id) FROM texts
             WHERE author_id IN (
                SELECT author_id FROM authors WHERE unique_word_count IS NOT NULL
             )",
            [],
            |row| row.get(0),
        )?;
        Ok(to_count(count))
    }

    fn top_authors(&self, limit: usize) -> StorageResult<Vec<AuthorDetails>> {
        let sql = format!(
            "{} ORDER BY a.unique_word_count IS NULL, a.unique_word_count DESC, a.author_id
             LIMIT ?1",
            AUTHOR_DETAILS_SQL
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = stmt
            .query_map(params![limit], author_details_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(finish_author_details).collect()
    }

    fn get_author(&self, author_id: i64) -> StorageResult<Option<AuthorDetails>> {
        let sql = format!("{} WHERE a.author_id = ?1", AUTHOR_DETAILS_SQL);
        let row = self
            .conn
            .query_row(&sql, params![author_id], author_details_from_row)
            .optional()?;

        row.map(finish_author_details).transpose()
    }
}
