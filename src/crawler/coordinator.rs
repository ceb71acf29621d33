//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates:
//! - Loading the seen-ID baseline and the existing-files set
//! - Walking the query space key by key
//! - Resolving authors, downloading and unpacking packages
//! - Writing text files and identity rows
//! - Pacing and quota-based termination

use crate::config::Config;
use crate::corpus::{country_dir, scan_existing_files, text_file_name};
use crate::crawler::authors::{AuthorResolver, ResolvedAuthor};
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::package::extract_text;
use crate::crawler::parser::{package_url, parse_search_results, search_url, TextCandidate};
use crate::crawler::query::QueryKeys;
use crate::state::{CandidateCheck, CrawlState};
use crate::storage::{SqliteStorage, TextStore};
use crate::CorpusError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Summary of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Query keys searched
    pub keys_searched: usize,
    /// Candidates returned by the catalog
    pub candidates_seen: usize,
    /// Candidates skipped because they were already known
    pub skipped_known: usize,
    /// Candidates that could not be downloaded, unpacked or saved
    pub failed: usize,
    /// New texts saved
    pub saved: usize,
    /// True if the run stopped on a shutdown request
    pub interrupted: bool,
}

/// Outcome of processing one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateOutcome {
    Saved,
    Known,
    Failed,
}

/// Main crawler coordinator structure
///
/// Owns the store connection and all per-run state for the duration of one
/// crawl; both are released when the coordinator is dropped.
pub struct Coordinator<S: TextStore> {
    config: Arc<Config>,
    storage: S,
    fetcher: Fetcher,
    authors: AuthorResolver,
    state: CrawlState,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<S: TextStore> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// Loads the seen-ID set from the store and scans the corpus directory
    /// (creating it if needed). Failure of either is fatal for the run.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - The text store, held for the whole run
    /// * `quota` - Number of new texts after which the crawl stops
    pub fn new(config: Config, storage: S, quota: usize) -> Result<Self, CorpusError> {
        let seen_ids = storage.list_known_text_ids()?;
        let existing_files = scan_existing_files(&config.output.data_dir)?;
        tracing::info!(
            "Loaded {} known text IDs and {} existing files",
            seen_ids.len(),
            existing_files.len()
        );

        let fetcher = Fetcher::from_config(&config.catalog, &config.retry)?;
        let authors = AuthorResolver::new(
            fetcher.clone(),
            config.catalog.base_url.clone(),
            config.crawler.author_delay(),
        );

        Ok(Self {
            config: Arc::new(config),
            storage,
            fetcher,
            authors,
            state: CrawlState::new(seen_ids, existing_files, quota),
            shutdown: None,
        })
    }

    /// Stops the crawl between candidates once `true` is sent on the channel
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Runs the main crawl loop
    ///
    /// For each query key, searches the catalog and processes candidates in
    /// order until the quota is reached or the keys run out. Every per-key
    /// and per-candidate failure is logged and skipped.
    pub async fn run(&mut self) -> Result<CrawlReport, CorpusError> {
        let keys = QueryKeys::new(&self.config.crawler.alphabet);
        tracing::info!(
            "Starting crawl: quota {}, {} query keys",
            self.state.quota(),
            keys.total()
        );

        let start_time = Instant::now();
        let mut interrupted = false;

        'keys: for key in keys {
            if self.state.quota_reached() {
                break;
            }
            if self.shutdown_requested() {
                interrupted = true;
                break;
            }

            tracing::info!("Searching key: {}", key);
            let candidates = self.search(&key).await;
            self.state.keys_searched += 1;
            self.state.candidates_seen += candidates.len();

            for candidate in &candidates {
                if self.state.quota_reached() {
                    break 'keys;
                }
                if self.shutdown_requested() {
                    interrupted = true;
                    break 'keys;
                }

                match self.process_candidate(candidate).await {
                    CandidateOutcome::Saved => {
                        if self.state.quota_reached() {
                            break 'keys;
                        }
                        tokio::time::sleep(self.config.crawler.save_delay()).await;
                    }
                    CandidateOutcome::Known => self.state.skipped_known += 1,
                    CandidateOutcome::Failed => self.state.failed += 1,
                }
            }

            tokio::time::sleep(self.config.crawler.key_delay()).await;
        }

        let report = CrawlReport {
            keys_searched: self.state.keys_searched,
            candidates_seen: self.state.candidates_seen,
            skipped_known: self.state.skipped_known,
            failed: self.state.failed,
            saved: self.state.saved,
            interrupted,
        };

        tracing::info!(
            "Crawl finished in {:?}: {} new files, {} keys searched, {} known, {} failed{}",
            start_time.elapsed(),
            report.saved,
            report.keys_searched,
            report.skipped_known,
            report.failed,
            if interrupted { " (interrupted)" } else { "" }
        );

        Ok(report)
    }

    /// Searches the catalog for one key; any failure yields no candidates
    async fn search(&self, key: &str) -> Vec<TextCandidate> {
        let url = match search_url(&self.config.catalog.base_url, key) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build search URL for '{}': {}", key, e);
                return Vec::new();
            }
        };

        match self.fetcher.fetch_body(url.as_str()).await {
            FetchResult::Success { body, .. } => parse_search_results(&String::from_utf8_lossy(&body)),
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Search for '{}' returned HTTP {}", key, status_code);
                Vec::new()
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Search for '{}' failed: {}", key, error);
                Vec::new()
            }
        }
    }

    /// Downloads and unpacks a text; any failure yields `None`
    async fn download(&self, text_id: i64) -> Option<String> {
        let url = package_url(&self.config.catalog.download_url, text_id).ok()?;

        let body = match self.fetcher.fetch_body(url.as_str()).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Package for text {} returned HTTP {}", text_id, status_code);
                return None;
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Package for text {} failed: {}", text_id, error);
                return None;
            }
        };

        match extract_text(&body) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Cannot unpack text {}: {}", text_id, e);
                None
            }
        }
    }

    /// Processes a single candidate
    ///
    /// This method:
    /// 1. Skips candidates whose ID or file is already known
    /// 2. Resolves the author (serialized, cached)
    /// 3. Downloads and unpacks the package
    /// 4. Records the text row and writes the file under the author's country
    async fn process_candidate(&mut self, candidate: &TextCandidate) -> CandidateOutcome {
        let text_id = candidate.text_id;
        let file_name = text_file_name(text_id, &candidate.title);

        match self.state.check_candidate(text_id, &file_name) {
            CandidateCheck::New => {}
            check => {
                tracing::debug!("Skipping text {} ({:?})", text_id, check);
                return CandidateOutcome::Known;
            }
        }

        let author = self
            .authors
            .resolve(candidate.author_id, &mut self.storage)
            .await;

        tracing::info!(
            "[{}/{}] Downloading: {}",
            self.state.saved + 1,
            self.state.quota(),
            candidate.title
        );
        let Some(body) = self.download(text_id).await else {
            return CandidateOutcome::Failed;
        };

        match self.save(candidate, author.as_ref(), &file_name, &body).await {
            Ok(()) => {
                tracing::info!(
                    "[{}/{}] Saved: {}",
                    self.state.saved,
                    self.state.quota(),
                    file_name
                );
                CandidateOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to save text {}: {}", text_id, e);
                CandidateOutcome::Failed
            }
        }
    }

    async fn save(
        &mut self,
        candidate: &TextCandidate,
        author: Option<&ResolvedAuthor>,
        file_name: &str,
        body: &str,
    ) -> Result<(), CorpusError> {
        self.storage.upsert_text(
            candidate.text_id,
            &candidate.title,
            author.map(|a| a.author_id),
        )?;
        self.state.mark_seen(candidate.text_id);

        let dir = match author {
            Some(author) => country_dir(&self.config.output.data_dir, Some(&author.country)),
            None => self.config.output.unknown_path(),
        };
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), body).await?;

        self.state.record_saved(file_name.to_string());
        Ok(())
    }
}

/// Runs a crawl against the configured database
///
/// Opens the store once for the whole run; failure to open it or to load
/// the seen-ID baseline is returned as an error. Everything else is
/// skipped and logged.
///
/// # Example
///
/// ```no_run
/// use chitanka_corpus::config::Config;
/// use chitanka_corpus::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(Config::default(), 10, None).await?;
/// println!("saved {}", report.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    quota: usize,
    shutdown: Option<watch::Receiver<bool>>,
) -> Result<CrawlReport, CorpusError> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let mut coordinator = Coordinator::new(config, storage, quota)?;
    if let Some(shutdown) = shutdown {
        coordinator = coordinator.with_shutdown(shutdown);
    }
    coordinator.run().await
}
