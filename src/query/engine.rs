// Pagination State Machine
//
// *Le Moteur* (The Engine) - Accumulates cursor pages per query key and decides which fetch may run next

use crate::errors::LeRecoError;
use crate::gateway::RecommendationParams;
use crate::query::cache::{CacheKey, QueryCache};
use crate::query::key::{QueryKey, RECOMMENDATIONS_NAMESPACE};
use crate::types::{AvailableTags, Page, Recommendation};
use std::collections::HashSet;
use tracing::debug;

/// Which page a fetch is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Page 1 of a (re)started result set
    FirstPage,

    /// A continuation page
    NextPage,
}

/// Engine state for the active key
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// No key selected yet, or the accumulation was invalidated and not yet re-read
    Idle,

    /// First page in flight
    Loading,

    /// At least one page accumulated, nothing in flight
    Ready,

    /// Continuation page in flight
    LoadingMore,

    /// Last fetch failed; earlier pages are kept
    Error {
        /// Display message of the failure
        message: String,

        /// The fetch that failed
        during: FetchKind,
    },
}

/// Tag carried by each in-flight fetch.
///
/// A completion is applied only if its ticket still matches the engine's
/// active key and generation; anything else is a stale response and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
    cursor: Option<String>,
    kind: FetchKind,
}

impl FetchTicket {
    /// Key active when the fetch was issued
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Cursor requested (`None` for the first page)
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Which page this fetch is for
    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    /// Request parameters for this fetch
    pub fn params(&self, limit: u32) -> RecommendationParams {
        self.key.params(self.cursor.clone(), limit)
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was folded into the engine state
    Applied,

    /// The ticket was stale; the result was dropped
    Discarded,
}

/// Accumulated pages for one query key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pages: Vec<Page>,
}

impl ResultSet {
    fn first(page: Page) -> Self {
        Self { pages: vec![page] }
    }

    /// Pages in fetch order
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Flattened items in page order. An id seen on an earlier page wins; later
    /// duplicates (items shifted across a page boundary) are skipped.
    pub fn items(&self) -> Vec<&Recommendation> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.pages
            .iter()
            .flat_map(|page| page.items.iter())
            .filter(|item| seen.insert(item.id.as_str()))
            .collect()
    }

    /// Cursor for the next page, from the last page fetched
    pub fn next_cursor(&self) -> Option<&str> {
        self.pages.last().and_then(|p| p.next_cursor.as_deref())
    }

    /// Facet vocabulary from the first page
    pub fn available_tags(&self) -> Option<&AvailableTags> {
        self.pages.first().and_then(|p| p.available_tags.as_ref())
    }

    /// Total reported by the most recent page
    pub fn total_items(&self) -> u64 {
        self.pages.last().map(|p| p.total_items).unwrap_or(0)
    }
}

/// Paginated query engine.
///
/// Purely synchronous: it hands out [`FetchTicket`]s and folds completions
/// back in. Whoever performs the I/O (see [`super::RecommendationFeed`])
/// decides when completions arrive, in any order.
pub struct PaginatedQuery {
    cache: QueryCache<ResultSet>,
    active: Option<QueryKey>,
    state: QueryState,
    generation: u64,
    in_flight: Option<FetchTicket>,
}

impl PaginatedQuery {
    /// Create an engine whose cache holds up to `cache_capacity` result sets
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: QueryCache::new(cache_capacity),
            active: None,
            state: QueryState::Idle,
            generation: 0,
            in_flight: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Active key, if any
    pub fn active_key(&self) -> Option<&QueryKey> {
        self.active.as_ref()
    }

    /// Fetch currently outstanding, if any
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    /// Accumulated result set for the active key
    pub fn result_set(&self) -> Option<&ResultSet> {
        let key = self.active.as_ref()?;
        self.cache.peek(&key.cache_key())
    }

    /// Flattened items for display
    pub fn items(&self) -> Vec<&Recommendation> {
        self.result_set().map(ResultSet::items).unwrap_or_default()
    }

    /// Whether a next cursor exists for the active key
    pub fn has_more(&self) -> bool {
        self.result_set()
            .and_then(ResultSet::next_cursor)
            .is_some()
    }

    /// First page in flight
    pub fn is_loading(&self) -> bool {
        self.state == QueryState::Loading
    }

    /// Continuation page in flight
    pub fn is_fetching_more(&self) -> bool {
        self.state == QueryState::LoadingMore
    }

    /// Facet vocabulary of the current result set (first page only)
    pub fn available_tags(&self) -> Option<&AvailableTags> {
        self.result_set().and_then(ResultSet::available_tags)
    }

    /// Number of cached result sets
    pub fn cached_sets(&self) -> usize {
        self.cache.len()
    }

    /// Select `key`.
    ///
    /// Re-selecting the active key is a read: it only fetches if the
    /// accumulation was invalidated. Any other key discards the previous
    /// accumulation and restarts from an empty set with page 1.
    pub fn set_key(&mut self, key: QueryKey) -> Option<FetchTicket> {
        if self.active.as_ref() == Some(&key) {
            return self.ensure_fresh();
        }

        if let Some(previous) = self.active.take() {
            self.cache.invalidate_exact(&previous.cache_key());
        }
        self.cache.invalidate_exact(&key.cache_key());
        debug!("Query key changed: {:?}", key);
        self.active = Some(key);
        self.start_first_page()
    }

    /// Read the active key: fetch page 1 if its accumulation is gone.
    ///
    /// No-op while a fetch is in flight, and after a failure (retrying is an
    /// explicit user gesture, see [`Self::retry`]).
    pub fn ensure_fresh(&mut self) -> Option<FetchTicket> {
        let key = self.active.as_ref()?;
        if self.in_flight.is_some() || matches!(self.state, QueryState::Error { .. }) {
            return None;
        }
        if self.cache.contains(&key.cache_key()) {
            return None;
        }
        self.start_first_page()
    }

    /// Request the next page.
    ///
    /// No-op unless the engine is `Ready` with a next cursor and nothing in
    /// flight, so repeated triggers can never stack concurrent fetches.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.state != QueryState::Ready || self.in_flight.is_some() {
            return None;
        }
        let key = self.active.clone()?;
        let cursor = self.result_set()?.next_cursor()?.to_string();

        self.state = QueryState::LoadingMore;
        let ticket = FetchTicket {
            key,
            generation: self.generation,
            cursor: Some(cursor),
            kind: FetchKind::NextPage,
        };
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// Repeat the fetch that failed
    pub fn retry(&mut self) -> Option<FetchTicket> {
        match self.state {
            QueryState::Error {
                during: FetchKind::FirstPage,
                ..
            } => self.start_first_page(),
            QueryState::Error {
                during: FetchKind::NextPage,
                ..
            } => {
                self.state = QueryState::Ready;
                self.load_more()
            }
            _ => None,
        }
    }

    /// Fold a completed fetch into the engine
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Page, LeRecoError>,
    ) -> Completion {
        if self.in_flight.as_ref() != Some(ticket)
            || ticket.generation != self.generation
            || self.active.as_ref() != Some(&ticket.key)
        {
            debug!(
                "Discarding stale {:?} result for {:?}",
                ticket.kind, ticket.key
            );
            return Completion::Discarded;
        }
        self.in_flight = None;

        let page = match outcome {
            Ok(page) => page,
            Err(e) => {
                debug!("{:?} fetch failed: {}", ticket.kind, e);
                self.state = QueryState::Error {
                    message: e.to_string(),
                    during: ticket.kind,
                };
                return Completion::Applied;
            }
        };

        let cache_key = ticket.key.cache_key();
        match ticket.kind {
            FetchKind::FirstPage => {
                self.cache.insert(cache_key, ResultSet::first(page));
                self.state = QueryState::Ready;
            }
            FetchKind::NextPage => match self.cache.get_mut(&cache_key) {
                Some(set) => {
                    set.pages.push(page);
                    self.state = QueryState::Ready;
                }
                None => {
                    // Evicted while in flight; the next read starts over
                    self.state = QueryState::Idle;
                }
            },
        }
        Completion::Applied
    }

    /// Drop every cached recommendation result set.
    ///
    /// Any in-flight fetch becomes stale, and the active key re-fetches page 1
    /// on its next read. Returns the number of result sets removed.
    pub fn invalidate_namespace(&mut self) -> usize {
        let removed = self
            .cache
            .invalidate_prefix(&CacheKey::namespace(RECOMMENDATIONS_NAMESPACE));
        self.generation += 1;
        self.in_flight = None;
        if self.active.is_some() {
            self.state = QueryState::Idle;
        }
        debug!("Invalidated {} cached result set(s)", removed);
        removed
    }

    fn start_first_page(&mut self) -> Option<FetchTicket> {
        let key = self.active.clone()?;
        self.generation += 1;
        self.state = QueryState::Loading;
        let ticket = FetchTicket {
            key,
            generation: self.generation,
            cursor: None,
            kind: FetchKind::FirstPage,
        };
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }
}
