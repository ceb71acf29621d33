//! Output module for corpus reports
//!
//! This module handles:
//! - Loading aggregate corpus statistics from the store
//! - Rendering the statistics and single-author reports

pub mod stats;

pub use stats::{
    format_author, format_statistics, load_statistics, print_author, print_statistics,
    CorpusStatistics,
};
