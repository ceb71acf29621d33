//! Integration tests for the analyzer
//!
//! These tests seed a store and a corpus directory by hand, then run both
//! analysis passes over them.

use chitanka_corpus::analyzer::{analyze_corpus, run_analysis, AnalysisReport};
use chitanka_corpus::config::{Config, OutputConfig};
use chitanka_corpus::corpus::text_file_path;
use chitanka_corpus::storage::{AuthorStats, SqliteStorage, TextStore};
use chrono::NaiveDate;
use std::path::Path;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn output_config(root: &Path) -> OutputConfig {
    OutputConfig {
        database_path: root.join("corpus.db").display().to_string(),
        data_dir: root.join("data"),
        unknown_dir: "Unknown".to_string(),
    }
}

/// Stores a text row and writes its file where the crawler would have
fn add_text(
    storage: &mut SqliteStorage,
    root: &Path,
    country: Option<&str>,
    author_id: Option<i64>,
    text_id: i64,
    title: &str,
    content: Option<&str>,
) {
    storage.upsert_text(text_id, title, author_id).unwrap();
    if let Some(content) = content {
        let path = text_file_path(&root.join("data"), country, text_id, title);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

fn add_author(storage: &mut SqliteStorage, author_id: i64, name: &str, country: &str) {
    let country_id = storage.find_or_create_country(country).unwrap();
    storage
        .upsert_author(author_id, name, name, Some(country_id))
        .unwrap();
}

#[test]
fn test_author_aggregation() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    add_author(&mut storage, 1, "Вазов", "BG");
    let bg = Some("BG");
    add_text(&mut storage, dir.path(), bg, Some(1), 10, "Първи", Some("Едно две три."));
    add_text(
        &mut storage,
        dir.path(),
        bg,
        Some(1),
        11,
        "Втори",
        Some("Едно две три четири пет."),
    );
    // No letters at all: zero average, excluded from the mean
    add_text(&mut storage, dir.path(), bg, Some(1), 12, "Трети", Some("1234"));

    let report = analyze_corpus(&mut storage, &output, day(1)).unwrap();
    assert_eq!(report.authors_considered, 1);
    assert_eq!(report.authors_updated, 1);
    assert_eq!(report.texts_analyzed, 3);

    let author = storage.get_author(1).unwrap().unwrap();
    assert_eq!(
        author.stats,
        AuthorStats {
            avg_words_per_sentence: Some(4),
            unique_word_count: Some(5),
            longest_sentence: Some(5),
        }
    );
    assert_eq!(author.last_analyzed, Some(day(1)));

    assert_eq!(storage.text_word_count(10).unwrap(), Some(Some(3)));
    assert_eq!(storage.text_word_count(11).unwrap(), Some(Some(5)));
    assert_eq!(storage.text_word_count(12).unwrap(), Some(Some(0)));
}

#[test]
fn test_same_day_rerun_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    add_author(&mut storage, 1, "Вазов", "BG");
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 10, "Първи", Some("Едно две."));

    analyze_corpus(&mut storage, &output, day(1)).unwrap();

    // A new text appears later the same day; the author is not reselected
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 11, "Втори", Some("Три."));
    let report = analyze_corpus(&mut storage, &output, day(1)).unwrap();

    assert_eq!(report.authors_considered, 0);
    assert_eq!(storage.text_word_count(11).unwrap(), Some(None));

    // Next day it is picked up
    let report = analyze_corpus(&mut storage, &output, day(2)).unwrap();
    assert_eq!(report.authors_updated, 1);
    assert_eq!(report.texts_analyzed, 1);
    assert_eq!(storage.text_word_count(11).unwrap(), Some(Some(1)));
}

#[test]
fn test_analyzed_text_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    add_author(&mut storage, 1, "Вазов", "BG");
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 10, "Първи", Some("Една дума."));
    storage.update_text_word_count(10, 999, day(1)).unwrap();

    analyze_corpus(&mut storage, &output, day(2)).unwrap();
    assert_eq!(storage.text_word_count(10).unwrap(), Some(Some(999)));
}

#[test]
fn test_author_with_nothing_new_stays_pending() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    add_author(&mut storage, 1, "Вазов", "BG");
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 10, "Първи", Some("Едно две."));
    analyze_corpus(&mut storage, &output, day(1)).unwrap();

    // Everything already analyzed: considered, but not updated
    let report = analyze_corpus(&mut storage, &output, day(2)).unwrap();
    assert_eq!(report.authors_considered, 1);
    assert_eq!(report.authors_updated, 0);

    let author = storage.get_author(1).unwrap().unwrap();
    assert_eq!(author.last_analyzed, Some(day(1)));

    // Still pending on the following day
    let report = analyze_corpus(&mut storage, &output, day(3)).unwrap();
    assert_eq!(report.authors_considered, 1);
}

#[test]
fn test_missing_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    add_author(&mut storage, 1, "Вазов", "BG");
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 10, "Липсва", None);
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 11, "Тук", Some("Тук съм."));
    add_text(&mut storage, dir.path(), Some("BG"), Some(1), 12, "Празен", Some(""));

    add_author(&mut storage, 2, "Ботев", "BG");
    add_text(&mut storage, dir.path(), Some("BG"), Some(2), 20, "Няма го", None);

    let report = analyze_corpus(&mut storage, &output, day(1)).unwrap();
    assert_eq!(report.authors_considered, 2);
    assert_eq!(report.authors_updated, 1);
    assert_eq!(report.texts_analyzed, 1);
    assert_eq!(report.texts_missing, 2);
    assert_eq!(report.texts_unreadable, 1);

    assert_eq!(storage.text_word_count(10).unwrap(), Some(None));
    assert_eq!(storage.text_word_count(11).unwrap(), Some(Some(2)));
    assert_eq!(storage.text_word_count(12).unwrap(), Some(None));

    let botev = storage.get_author(2).unwrap().unwrap();
    assert_eq!(botev.last_analyzed, None);
    assert_eq!(botev.stats, AuthorStats::default());
}

#[test]
fn test_unknown_directory_pass() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    add_text(&mut storage, dir.path(), None, None, 5, "Без автор", Some("Кой кой е."));
    add_text(&mut storage, dir.path(), None, None, 7, "Готов", Some("Нещо друго."));
    storage.update_text_word_count(7, 42, day(1)).unwrap();

    let unknown = dir.path().join("data").join("Unknown");
    // No row for this ID
    std::fs::write(unknown.join("6_Сирак!.txt"), "Сам.").unwrap();
    // Not matching the naming pattern
    std::fs::write(unknown.join("abc_Грешно.txt"), "Грешно.").unwrap();
    std::fs::write(unknown.join("8_Бележки.md"), "Бележки.").unwrap();
    storage.upsert_text(8, "Бележки", None).unwrap();

    let report = analyze_corpus(&mut storage, &output, day(2)).unwrap();
    assert_eq!(report.unknown_texts_analyzed, 1);
    assert_eq!(report.authors_considered, 0);

    assert_eq!(storage.text_word_count(5).unwrap(), Some(Some(2)));
    assert_eq!(storage.text_word_count(7).unwrap(), Some(Some(42)));
    assert_eq!(storage.text_word_count(6).unwrap(), None);
    assert_eq!(storage.text_word_count(8).unwrap(), Some(None));
}

#[test]
fn test_missing_unknown_directory_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let output = output_config(dir.path());
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = analyze_corpus(&mut storage, &output, day(1)).unwrap();
    assert_eq!(report, AnalysisReport::default());
}

#[test]
fn test_run_analysis_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        output: output_config(dir.path()),
        ..Config::default()
    };

    {
        let mut storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
        add_author(&mut storage, 1, "Вазов", "BG");
        add_text(
            &mut storage,
            dir.path(),
            Some("BG"),
            Some(1),
            10,
            "Под игото",
            Some("Език свещен на моите деди. Език на мъки!"),
        );
    }

    let report = run_analysis(&config).unwrap();
    assert_eq!(report.authors_updated, 1);

    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    let author = storage.get_author(1).unwrap().unwrap();
    assert_eq!(author.stats.longest_sentence, Some(5));
    assert_eq!(author.stats.unique_word_count, Some(6));
    // (5 + 3) / 2
    assert_eq!(author.stats.avg_words_per_sentence, Some(4));
}
