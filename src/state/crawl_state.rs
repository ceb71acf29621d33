use std::collections::HashSet;

/// Outcome of checking a candidate against what the run already knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateCheck {
    /// Neither the ID nor the file name has been seen
    New,

    /// The text ID is already in the store
    KnownId,

    /// A file with the derived name already exists on disk
    FileExists,
}

/// Bookkeeping for a single crawl run
///
/// Holds the seen-ID set (mirror of the store), the existing-files set
/// (mirror of the corpus directory) and the run's counters.
#[derive(Debug, Clone)]
pub struct CrawlState {
    seen_ids: HashSet<i64>,
    existing_files: HashSet<String>,
    quota: usize,

    /// Texts saved so far in this run
    pub saved: usize,

    /// Query keys searched
    pub keys_searched: usize,

    /// Candidates returned by the catalog
    pub candidates_seen: usize,

    /// Candidates skipped because their ID or file was already known
    pub skipped_known: usize,

    /// Candidates that failed to download, unpack or persist
    pub failed: usize,
}

impl CrawlState {
    /// Creates state for a run that stops after `quota` new texts
    pub fn new(seen_ids: HashSet<i64>, existing_files: HashSet<String>, quota: usize) -> Self {
        Self {
            seen_ids,
            existing_files,
            quota,
            saved: 0,
            keys_searched: 0,
            candidates_seen: 0,
            skipped_known: 0,
            failed: 0,
        }
    }

    /// Checks whether a candidate still needs downloading
    pub fn check_candidate(&self, text_id: i64, file_name: &str) -> CandidateCheck {
        if self.existing_files.contains(file_name) {
            CandidateCheck::FileExists
        } else if self.seen_ids.contains(&text_id) {
            CandidateCheck::KnownId
        } else {
            CandidateCheck::New
        }
    }

    /// Marks a text ID as present in the store
    pub fn mark_seen(&mut self, text_id: i64) {
        self.seen_ids.insert(text_id);
    }

    /// Records a text file as written and counts it towards the quota
    pub fn record_saved(&mut self, file_name: String) {
        self.existing_files.insert(file_name);
        self.saved += 1;
    }

    /// Returns true once the quota has been reached
    pub fn quota_reached(&self) -> bool {
        self.saved >= self.quota
    }

    pub fn quota(&self) -> usize {
        self.quota
    }
}
