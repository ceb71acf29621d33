//! State module for tracking crawl progress
//!
//! All mutable bookkeeping of one crawl run lives in [`CrawlState`]. It is
//! rebuilt from the store and the filesystem at the start of every run and
//! dropped at the end; nothing here is persisted.

mod crawl_state;

pub use crawl_state::{CandidateCheck, CrawlState};
