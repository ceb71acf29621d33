//! Text package extraction
//!
//! The catalog serves each text as a zip archive holding one plain-text file.

use std::io::{Cursor, Read};
use thiserror::Error;
use zip::ZipArchive;

/// Extension of the text-bearing entry inside a package
pub const TEXT_EXTENSION: &str = ".txt";

/// Errors that can occur while unpacking a text package
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Package contains no .txt file")]
    NoTextEntry,
}

/// Extracts the first `.txt` file from a zip package
///
/// Directories are ignored. The body is decoded as UTF-8, replacing invalid
/// sequences.
pub fn extract_text(package: &[u8]) -> Result<String, PackageError> {
    let mut archive = ZipArchive::new(Cursor::new(package))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !entry.name().ends_with(TEXT_EXTENSION) {
            continue;
        }

        let mut buffer = Vec::new();
        entry.read_to_end(&mut buffer)?;
        return Ok(String::from_utf8_lossy(&buffer).into_owned());
    }

    Err(PackageError::NoTextEntry)
}
