//! Lexical statistics for a single text
//!
//! A word is a maximal run of Unicode letters. Sentences are the non-blank
//! segments between runs of `.`, `!` and `?`.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}+").unwrap());

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Statistics computed for one text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStats {
    /// Lowercased distinct words
    pub unique_words: HashSet<String>,
    /// Number of word occurrences
    pub total_words: usize,
    /// Mean words per sentence, 0 when there are no sentences
    pub avg_words_per_sentence: f64,
    /// Word count of the longest sentence, 0 when there are no sentences
    pub longest_sentence: usize,
}

impl TextStats {
    pub fn unique_word_count(&self) -> usize {
        self.unique_words.len()
    }
}

/// Iterates over the words of a text, case preserved
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Splits a text into sentences, dropping blank segments
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_END
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Computes every statistic for a text
///
/// # Example
///
/// ```
/// use chitanka_corpus::analyzer::analyze_text;
///
/// let stats = analyze_text("Тест тест нов тест.");
/// assert_eq!(stats.unique_word_count(), 2);
/// assert_eq!(stats.total_words, 4);
/// ```
pub fn analyze_text(text: &str) -> TextStats {
    let mut unique_words = HashSet::new();
    let mut total_words = 0;
    for word in words(text) {
        unique_words.insert(word.to_lowercase());
        total_words += 1;
    }

    let sentence_lengths: Vec<usize> = sentences(text)
        .into_iter()
        .map(|s| words(s).count())
        .collect();

    let avg_words_per_sentence = if sentence_lengths.is_empty() {
        0.0
    } else {
        sentence_lengths.iter().sum::<usize>() as f64 / sentence_lengths.len() as f64
    };

    TextStats {
        unique_words,
        total_words,
        avg_words_per_sentence,
        longest_sentence: sentence_lengths.into_iter().max().unwrap_or(0),
    }
}
