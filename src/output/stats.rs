//! Statistics generation from the corpus database
//!
//! This module provides functionality for extracting and displaying
//! corpus statistics from the storage layer.

use crate::storage::{AuthorDetails, TextStore};
use crate::CorpusError;
use std::fmt::Write;

/// Corpus statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusStatistics {
    /// Total number of stored texts
    pub total_texts: u64,

    /// Sum of unique word counts over analyzed texts
    pub total_unique_words: u64,

    /// Authors referenced by at least one text
    pub total_authors: u64,

    /// Of those, authors that have aggregate statistics
    pub processed_authors: u64,

    /// Authors with the richest vocabulary first
    pub top_authors: Vec<AuthorDetails>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `top` - How many authors to include in the ranking
pub fn load_statistics(storage: &dyn TextStore, top: usize) -> Result<CorpusStatistics, CorpusError> {
    Ok(CorpusStatistics {
        total_texts: storage.count_texts()?,
        total_unique_words: storage.sum_text_unique_words()?,
        total_authors: storage.count_attributed_authors()?,
        processed_authors: storage.count_analyzed_authors()?,
        top_authors: storage.top_authors(top)?,
    })
}

fn or_dash(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Renders statistics as a plain-text report
pub fn format_statistics(stats: &CorpusStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Corpus Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Texts: {}", stats.total_texts);
    let _ = writeln!(out, "  Unique words (sum over texts): {}", stats.total_unique_words);
    let _ = writeln!(out, "  Authors: {}", stats.total_authors);

    let percentage = if stats.total_authors > 0 {
        (stats.processed_authors as f64 / stats.total_authors as f64) * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "  Analyzed authors: {} ({:.1}%)",
        stats.processed_authors, percentage
    );

    if !stats.top_authors.is_empty() {
        let _ = writeln!(out, "\nTop Authors by Unique Words:");
        for (rank, author) in stats.top_authors.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>3}. {} ({}): {} words, {} per sentence, longest {}",
                rank + 1,
                author.name,
                author.country_name.as_deref().unwrap_or("-"),
                or_dash(author.stats.unique_word_count),
                or_dash(author.stats.avg_words_per_sentence),
                or_dash(author.stats.longest_sentence)
            );
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CorpusStatistics) {
    print!("{}", format_statistics(stats));
}

/// Renders one author's record
pub fn format_author(author: &AuthorDetails) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Author {}", author.author_id);
    let _ = writeln!(out, "  Name: {}", author.name);
    let _ = writeln!(out, "  Original name: {}", author.original_name);
    let _ = writeln!(
        out,
        "  Country: {}",
        author.country_name.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "  Unique words: {}",
        or_dash(author.stats.unique_word_count)
    );
    let _ = writeln!(
        out,
        "  Words per sentence: {}",
        or_dash(author.stats.avg_words_per_sentence)
    );
    let _ = writeln!(
        out,
        "  Longest sentence: {}",
        or_dash(author.stats.longest_sentence)
    );
    let _ = writeln!(
        out,
        "  Last analyzed: {}",
        author
            .last_analyzed
            .map_or_else(|| "never".to_string(), |d| d.to_string())
    );

    out
}

pub fn print_author(author: &AuthorDetails) {
    print!("{}", format_author(author));
}
