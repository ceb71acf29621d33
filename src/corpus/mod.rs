//! On-disk corpus layout
//!
//! Texts live at `<root>/<country>/<text id>_<title>!.txt`. Both path
//! components are derived only from the country name, the text ID and the
//! title, so the analyzer can find a file without any extra lookups.
//! Texts whose author could not be resolved go under the `Unknown` directory.

use regex::Regex;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Directory name used when a text has no resolved country
pub const UNKNOWN_COUNTRY: &str = "Unknown";

static FORBIDDEN_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[/:*?"<>|]"#).unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static UNDERSCORE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

static UNKNOWN_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)_(.+)\.txt$").unwrap());

/// Makes a string safe to use as a single path component
///
/// Trims the input, replaces characters that are invalid in file names and
/// runs of whitespace with `_`, then collapses repeated underscores.
///
/// # Example
///
/// ```
/// use chitanka_corpus::corpus::safe_name;
///
/// assert_eq!(safe_name("  Под игото: роман "), "Под_игото_роман");
/// ```
pub fn safe_name(s: &str) -> String {
    let replaced = FORBIDDEN_CHARS.replace_all(s.trim(), "_");
    let replaced = WHITESPACE_RUN.replace_all(&replaced, "_");
    UNDERSCORE_RUN.replace_all(&replaced, "_").into_owned()
}

/// File name of a stored text
pub fn text_file_name(text_id: i64, title: &str) -> String {
    format!("{}_{}!.txt", text_id, safe_name(title))
}

/// Directory holding texts from a country
///
/// A missing country, or one that does not sanitize to a normal directory
/// name (empty, `.` or `..`), maps to `Unknown`, so the result is always a
/// direct child of `root`.
pub fn country_dir(root: &Path, country: Option<&str>) -> PathBuf {
    let name = country.map(safe_name).unwrap_or_default();
    if matches!(name.as_str(), "" | "." | "..") {
        root.join(UNKNOWN_COUNTRY)
    } else {
        root.join(name)
    }
}

/// Full path of a stored text
pub fn text_file_path(root: &Path, country: Option<&str>, text_id: i64, title: &str) -> PathBuf {
    country_dir(root, country).join(text_file_name(text_id, title))
}

/// Extracts the text ID from a file name in the Unknown directory
///
/// Only names of the form `<digits>_<anything>.txt` are accepted.
pub fn parse_unknown_file_name(file_name: &str) -> Option<i64> {
    let captures = UNKNOWN_FILE_NAME.captures(file_name)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Collects the names of all files one level below the country directories
///
/// The root is created if it does not exist yet.
pub fn scan_existing_files(root: &Path) -> io::Result<HashSet<String>> {
    std::fs::create_dir_all(root)?;

    let mut existing = HashSet::new();
    for country in std::fs::read_dir(root)? {
        let country = country?;
        if !country.file_type()?.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(country.path())? {
            let file = file?;
            if let Some(name) = file.file_name().to_str() {
                existing.insert(name.to_string());
            }
        }
    }

    Ok(existing)
}
