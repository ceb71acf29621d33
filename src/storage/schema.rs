//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the corpus database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Countries, created lazily when an author is resolved
CREATE TABLE IF NOT EXISTS countries (
    country_id INTEGER PRIMARY KEY AUTOINCREMENT,
    country_name TEXT NOT NULL UNIQUE
);

-- Authors: identity written by the crawler, statistics by the analyzer
CREATE TABLE IF NOT EXISTS authors (
    author_id INTEGER PRIMARY KEY,
    author_name TEXT NOT NULL,
    original_name TEXT NOT NULL,
    country_id INTEGER REFERENCES countries(country_id),
    unique_word_count INTEGER,
    words_per_sentence INTEGER,
    longest_sentence INTEGER,
    last_analyzed TEXT
);

CREATE INDEX IF NOT EXISTS idx_authors_last_analyzed ON authors(last_analyzed);

-- Texts: identity written by the crawler, word count by the analyzer
CREATE TABLE IF NOT EXISTS texts (
    text_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    author_id INTEGER REFERENCES authors(author_id),
    unique_word_count INTEGER,
    last_analyzed TEXT
);

CREATE INDEX IF NOT EXISTS idx_texts_author ON texts(author_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
