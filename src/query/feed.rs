//! Recommendation feed: the engine bound to an API implementation
//!
//! Runs on a single thread. The engine lives in a `RefCell` and no borrow is
//! held across an `.await`, so several feed futures can be in progress at once
//! (joined on one task) and complete in any order; stale completions are
//! dropped by the engine's ticket check.

use crate::errors::Result;
use crate::gateway::RecommendationApi;
use crate::query::engine::{Completion, FetchTicket, PaginatedQuery};
use crate::query::key::QueryKey;
use std::cell::{Ref, RefCell};
use tracing::{debug, info, warn};

/// Paginated recommendation feed
pub struct RecommendationFeed<A> {
    api: A,
    engine: RefCell<PaginatedQuery>,
    page_limit: u32,
}

impl<A: RecommendationApi> RecommendationFeed<A> {
    /// Create a feed requesting `page_limit` items per page
    pub fn new(api: A, page_limit: u32, cache_capacity: usize) -> Self {
        Self {
            api,
            engine: RefCell::new(PaginatedQuery::new(cache_capacity)),
            page_limit,
        }
    }

    /// Underlying API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Read access to the engine for rendering. Do not hold across `.await`.
    pub fn engine(&self) -> Ref<'_, PaginatedQuery> {
        self.engine.borrow()
    }

    /// Select a query key, fetching page 1 if needed
    pub async fn select(&self, key: QueryKey) -> Result<()> {
        let ticket = self.engine.borrow_mut().set_key(key);
        self.run(ticket).await
    }

    /// Re-read the active key; fetches page 1 if the accumulation was invalidated
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.engine.borrow_mut().ensure_fresh();
        self.run(ticket).await
    }

    /// Fetch the next page. Returns `false` when the guard refused (already
    /// fetching, or no next cursor).
    pub async fn load_more(&self) -> Result<bool> {
        let ticket = self.engine.borrow_mut().load_more();
        if ticket.is_none() {
            return Ok(false);
        }
        self.run(ticket).await?;
        Ok(true)
    }

    /// Repeat the fetch that last failed
    pub async fn retry(&self) -> Result<()> {
        let ticket = self.engine.borrow_mut().retry();
        self.run(ticket).await
    }

    /// Archive or unarchive `id`.
    ///
    /// On success every recommendation result set is invalidated and the
    /// active key is re-read from page 1: the server may now filter the item
    /// out of (or into) the current view, so patching it locally would be
    /// wrong. Returns the server's `success` flag. A failed refetch does not
    /// fail the mutation; it is left in the engine's error state.
    pub async fn set_archived(&self, id: &str, archived: bool) -> Result<bool> {
        let response = self.api.set_archived(id, archived).await?;
        if !response.success {
            debug!("Server declined archive change for {}", id);
            return Ok(false);
        }

        info!(
            "{} recommendation {}",
            if archived { "Archived" } else { "Unarchived" },
            id
        );
        self.engine.borrow_mut().invalidate_namespace();
        if let Err(e) = self.refresh().await {
            warn!("Refetch after archive change failed: {}", e);
        }
        Ok(true)
    }

    async fn run(&self, ticket: Option<FetchTicket>) -> Result<()> {
        let Some(ticket) = ticket else {
            return Ok(());
        };

        let params = ticket.params(self.page_limit);
        let outcome = self.api.fetch_recommendations(&params).await;
        let failure = outcome.as_ref().err().cloned();

        let completion = self.engine.borrow_mut().complete(&ticket, outcome);
        match (completion, failure) {
            (Completion::Applied, Some(e)) => Err(e),
            _ => Ok(()),
        }
    }
}
