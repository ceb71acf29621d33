//! Corpus analyzer
//!
//! Runs two independent passes over the stored corpus:
//! - Pass A walks authors not yet analyzed today, computes statistics for
//!   each of their unanalyzed texts and aggregates them per author
//! - Pass B walks the Unknown directory and records word counts for texts
//!   without a resolved author
//!
//! Store failures abort the run. Missing or unreadable files are logged and
//! skipped.

mod text_stats;

pub use text_stats::{analyze_text, sentences, words, TextStats};

use crate::config::{Config, OutputConfig};
use crate::corpus::{parse_unknown_file_name, text_file_path};
use crate::storage::{AuthorStats, PendingAuthor, SqliteStorage, TextStore};
use crate::CorpusError;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Summary of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Authors selected for Pass A
    pub authors_considered: usize,
    /// Authors whose aggregate statistics were written
    pub authors_updated: usize,
    /// Attributed texts analyzed in Pass A
    pub texts_analyzed: usize,
    /// Texts whose file does not exist
    pub texts_missing: usize,
    /// Texts whose file could not be read or was empty
    pub texts_unreadable: usize,
    /// Texts analyzed from the Unknown directory in Pass B
    pub unknown_texts_analyzed: usize,
}

/// Running aggregate over one author's texts
#[derive(Debug, Default)]
struct AuthorAggregate {
    unique_words: HashSet<String>,
    positive_averages: Vec<f64>,
    longest_sentence: usize,
    processed: usize,
}

impl AuthorAggregate {
    fn add(&mut self, stats: TextStats) {
        if stats.avg_words_per_sentence > 0.0 {
            self.positive_averages.push(stats.avg_words_per_sentence);
        }
        self.longest_sentence = self.longest_sentence.max(stats.longest_sentence);
        self.unique_words.extend(stats.unique_words);
        self.processed += 1;
    }

    /// Final statistics
    ///
    /// The average is `None` when no text had a positive average; a positive
    /// mean that rounds down to 0 is kept as 0. Zero unique words and a zero
    /// longest sentence become `None`.
    fn finish(&self) -> AuthorStats {
        let avg = if self.positive_averages.is_empty() {
            None
        } else {
            let mean =
                self.positive_averages.iter().sum::<f64>() / self.positive_averages.len() as f64;
            Some(mean.round() as i64)
        };

        AuthorStats {
            avg_words_per_sentence: avg,
            unique_word_count: non_zero(self.unique_words.len()),
            longest_sentence: non_zero(self.longest_sentence),
        }
    }
}

fn non_zero(value: usize) -> Option<i64> {
    (value > 0).then_some(value as i64)
}

/// Result of trying to read one text file
enum FileRead {
    Content(String),
    Missing,
    Unreadable,
}

fn read_text_file(path: &Path) -> FileRead {
    match std::fs::read(path) {
        Ok(bytes) if bytes.is_empty() => {
            tracing::warn!("Empty file: {}", path.display());
            FileRead::Unreadable
        }
        Ok(bytes) => FileRead::Content(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("File not found: {}", path.display());
            FileRead::Missing
        }
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", path.display(), e);
            FileRead::Unreadable
        }
    }
}

/// Runs both analysis passes against a store
///
/// # Arguments
///
/// * `storage` - The text store, held for the whole run
/// * `output` - Corpus locations
/// * `today` - Date stamped on every update and used to skip authors
///   already analyzed
pub fn analyze_corpus<S: TextStore>(
    storage: &mut S,
    output: &OutputConfig,
    today: NaiveDate,
) -> Result<AnalysisReport, CorpusError> {
    let mut report = AnalysisReport::default();
    analyze_authors(storage, &output.data_dir, today, &mut report)?;
    analyze_unknown(storage, &output.unknown_path(), today, &mut report)?;

    tracing::info!(
        "Analysis finished: {} of {} authors updated, {} texts analyzed, \
         {} unknown-author texts analyzed, {} missing, {} unreadable",
        report.authors_updated,
        report.authors_considered,
        report.texts_analyzed,
        report.unknown_texts_analyzed,
        report.texts_missing,
        report.texts_unreadable
    );

    Ok(report)
}

/// Pass A: per-author analysis
pub fn analyze_authors<S: TextStore>(
    storage: &mut S,
    data_dir: &Path,
    today: NaiveDate,
    report: &mut AnalysisReport,
) -> Result<(), CorpusError> {
    let pending = storage.list_authors_pending_analysis(today)?;
    tracing::info!("{} authors pending analysis", pending.len());
    report.authors_considered += pending.len();

    for author in &pending {
        analyze_author(storage, data_dir, author, today, report)?;
    }

    Ok(())
}

fn analyze_author<S: TextStore>(
    storage: &mut S,
    data_dir: &Path,
    author: &PendingAuthor,
    today: NaiveDate,
    report: &mut AnalysisReport,
) -> Result<(), CorpusError> {
    let mut aggregate = AuthorAggregate::default();

    for text in storage.list_texts_for_author(author.author_id)? {
        if text.unique_word_count.is_some() {
            continue;
        }

        let path = text_file_path(
            data_dir,
            author.country_name.as_deref(),
            text.text_id,
            &text.title,
        );
        let content = match read_text_file(&path) {
            FileRead::Content(content) => content,
            FileRead::Missing => {
                report.texts_missing += 1;
                continue;
            }
            FileRead::Unreadable => {
                report.texts_unreadable += 1;
                continue;
            }
        };

        let stats = analyze_text(&content);
        storage.update_text_word_count(text.text_id, stats.unique_word_count() as i64, today)?;
        tracing::debug!(
            "Text {}: {} unique words",
            text.text_id,
            stats.unique_word_count()
        );

        aggregate.add(stats);
        report.texts_analyzed += 1;
    }

    // Authors with nothing new stay pending and are reconsidered next run
    if aggregate.processed == 0 {
        return Ok(());
    }

    let stats = aggregate.finish();
    storage.update_author_stats(author.author_id, &stats, today)?;
    report.authors_updated += 1;
    tracing::info!(
        "Author {}: {} texts, {:?} unique words",
        author.author_id,
        aggregate.processed,
        stats.unique_word_count
    );

    Ok(())
}

/// Pass B: texts filed under the Unknown directory
///
/// A missing directory is not an error. Files not named
/// `<digits>_<rest>.txt`, texts without a row and texts that already have a
/// word count are skipped.
pub fn analyze_unknown<S: TextStore>(
    storage: &mut S,
    unknown_dir: &Path,
    today: NaiveDate,
    report: &mut AnalysisReport,
) -> Result<(), CorpusError> {
    let entries = match std::fs::read_dir(unknown_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No unknown-author directory at {}", unknown_dir.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(text_id) = file_name.to_str().and_then(parse_unknown_file_name) else {
            continue;
        };

        match storage.text_word_count(text_id)? {
            Some(None) => {}
            Some(Some(_)) => continue,
            None => {
                tracing::debug!("No text row for {}", entry.path().display());
                continue;
            }
        }

        let content = match read_text_file(&entry.path()) {
            FileRead::Content(content) => content,
            FileRead::Missing => {
                report.texts_missing += 1;
                continue;
            }
            FileRead::Unreadable => {
                report.texts_unreadable += 1;
                continue;
            }
        };

        let count = analyze_text(&content).unique_word_count() as i64;
        if storage.update_text_word_count(text_id, count, today)? {
            report.unknown_texts_analyzed += 1;
        }
    }

    Ok(())
}

/// Runs a full analysis against the configured database, dated today
pub fn run_analysis(config: &Config) -> Result<AnalysisReport, CorpusError> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    analyze_corpus(&mut storage, &config.output, Local::now().date_naive())
}
