//! Author resolution
//!
//! Author metadata comes from a separately rate-limited endpoint, so every
//! lookup goes through a single permit: one lookup at a time across the
//! whole run, and the permit stays held for a cool-down after each lookup.
//! Results are cached per run by catalog author ID.

use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::parser::{parse_person, person_url};
use crate::storage::TextStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

/// An author known to the store, with the country its texts are filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAuthor {
    pub author_id: i64,
    pub name: String,
    pub original_name: String,
    pub country: String,
    pub country_id: i64,
}

/// Cached, serialized author lookups
pub struct AuthorResolver {
    fetcher: Fetcher,
    base_url: String,
    cool_down: Duration,
    permit: Semaphore,
    cache: Mutex<HashMap<i64, ResolvedAuthor>>,
    lookups: AtomicUsize,
}

impl AuthorResolver {
    /// Creates a resolver that pauses `cool_down` after each remote lookup
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>, cool_down: Duration) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            cool_down,
            permit: Semaphore::new(1),
            cache: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of remote lookups performed so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn cached(&self, author_id: i64) -> Option<ResolvedAuthor> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&author_id).cloned())
    }

    /// Resolves a catalog author, creating its country and author rows
    ///
    /// Returns `None` when the text has no author or the lookup fails for
    /// any reason; failures are logged and never propagated. Only successful
    /// lookups are cached.
    pub async fn resolve<S: TextStore>(
        &self,
        author_id: Option<i64>,
        storage: &mut S,
    ) -> Option<ResolvedAuthor> {
        let author_id = author_id?;
        if let Some(author) = self.cached(author_id) {
            return Some(author);
        }

        let _permit = self.permit.acquire().await.ok()?;

        // Another lookup may have filled the cache while we waited
        if let Some(author) = self.cached(author_id) {
            return Some(author);
        }

        let resolved = self.lookup(author_id, storage).await;
        if let Some(author) = &resolved {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(author_id, author.clone());
            }
        }

        tokio::time::sleep(self.cool_down).await;
        resolved
    }

    async fn lookup<S: TextStore>(&self, author_id: i64, storage: &mut S) -> Option<ResolvedAuthor> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let url = match person_url(&self.base_url, author_id) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build person URL for author {}: {}", author_id, e);
                return None;
            }
        };

        let body = match self.fetcher.fetch_body(url.as_str()).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Author lookup for ID {} returned HTTP {}", author_id, status_code);
                return None;
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Author lookup for ID {} failed: {}", author_id, error);
                return None;
            }
        };

        let Some(person) = parse_person(&String::from_utf8_lossy(&body)) else {
            tracing::warn!("Author XML for ID {} is empty or invalid", author_id);
            return None;
        };

        let stored = storage
            .find_or_create_country(&person.country)
            .and_then(|country_id| {
                storage
                    .upsert_author(
                        author_id,
                        &person.name,
                        &person.original_name,
                        Some(country_id),
                    )
                    .map(|()| country_id)
            });

        match stored {
            Ok(country_id) => Some(ResolvedAuthor {
                author_id,
                name: person.name,
                original_name: person.original_name,
                country: person.country,
                country_id,
            }),
            Err(e) => {
                tracing::error!("Failed to store author {}: {}", author_id, e);
                None
            }
        }
    }
}
