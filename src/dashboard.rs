// Dashboard
//
// *Le Tableau de Bord* (The Dashboard) - Auth guard, filters, debounce, feed and list wired into one event-driven view

use crate::auth::{guard, AuthStore, RouteDecision};
use crate::boundary::{ErrorBoundary, Rendered};
use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::errors::{LeRecoError, Result};
use crate::filter::{FilterPanel, FilterState};
use crate::gateway::RecommendationApi;
use crate::list::ListView;
use crate::list::SentinelTracker;
use crate::query::{FetchKind, QueryState, RecommendationFeed};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Toast shown after an archive toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Heading
    pub title: &'static str,

    /// Body text
    pub description: &'static str,

    /// Rendered as an error
    pub destructive: bool,
}

impl Notification {
    /// Success toast for the new archive state
    pub fn updated(archived: bool) -> Self {
        Self {
            title: if archived {
                "Recommendation archived"
            } else {
                "Recommendation unarchived"
            },
            description: "The recommendation has been updated successfully.",
            destructive: false,
        }
    }

    /// Failure toast
    pub fn failed() -> Self {
        Self {
            title: "Error",
            description: "Failed to update recommendation status.",
            destructive: true,
        }
    }
}

/// The recommendations dashboard.
///
/// Events mutate the filter state and drive the feed; views are pure reads of
/// the current state. A search edit only reaches the feed once the debounce
/// window has passed without another edit (see [`Dashboard::tick`]).
pub struct Dashboard<A> {
    feed: RecommendationFeed<A>,
    filters: FilterState,
    debouncer: Debouncer<String>,
    sentinel: SentinelTracker,
    boundary: ErrorBoundary,
    skeleton_count: usize,
}

impl<A: RecommendationApi> Dashboard<A> {
    /// Open the dashboard behind the auth guard and fetch the first page.
    ///
    /// Fails with [`LeRecoError::Unauthenticated`] when no token is persisted.
    /// A failed first page does not fail the open; it shows in the list view.
    pub async fn open(api: A, auth: &AuthStore, config: &ClientConfig) -> Result<Self> {
        if let RouteDecision::RedirectToLogin = guard(auth) {
            debug!("No persisted token, redirecting to login");
            return Err(LeRecoError::Unauthenticated);
        }

        let dashboard = Self {
            feed: RecommendationFeed::new(api, config.api.page_limit, config.cache.capacity),
            filters: FilterState::new(),
            debouncer: Debouncer::new(config.debounce()),
            sentinel: SentinelTracker::new(),
            boundary: ErrorBoundary::new(),
            skeleton_count: config.ui.skeleton_count,
        };

        if let Err(e) = dashboard.feed.select(dashboard.filters.query_key()).await {
            warn!("First page failed: {}", e);
        }
        Ok(dashboard)
    }

    /// Underlying feed
    pub fn feed(&self) -> &RecommendationFeed<A> {
        &self.feed
    }

    /// Current filter state
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// A keystroke in the search box. Only the visible text changes now.
    pub fn type_search(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.filters.set_search_input(text.clone());
        self.debouncer.push(text, now);
    }

    /// Advance time. Commits a settled search edit and re-queries when it
    /// changed the key. Returns whether a query was issued.
    pub async fn tick(&mut self, now: Instant) -> Result<bool> {
        match self.debouncer.poll(now) {
            Some(text) => self.commit_search(text).await,
            None => Ok(false),
        }
    }

    /// Wait out the debounce window and commit the pending search edit
    pub async fn settle_search(&mut self) -> Result<bool> {
        match self.debouncer.settle().await {
            Some(text) => self.commit_search(text).await,
            None => Ok(false),
        }
    }

    async fn commit_search(&mut self, text: String) -> Result<bool> {
        if !self.filters.commit_search(text) {
            return Ok(false);
        }
        self.requery().await?;
        Ok(true)
    }

    /// Select or deselect a facet tag
    pub async fn toggle_tag(&mut self, tag: &str) -> Result<()> {
        self.filters.toggle_tag(tag);
        self.requery().await
    }

    /// Switch between the active and archived views
    pub async fn toggle_archive_view(&mut self) -> Result<()> {
        self.filters.toggle_archive_view();
        self.requery().await
    }

    async fn requery(&mut self) -> Result<()> {
        self.sentinel.reset();
        self.feed.select(self.filters.query_key()).await
    }

    /// A visibility sample for the trailing sentinel.
    ///
    /// Returns whether a next-page fetch was issued. Samples while no
    /// sentinel is rendered are ignored and reset the edge detector. When the
    /// last next page failed, the rising edge retries the same cursor.
    pub async fn sentinel_visibility(&mut self, visible: bool) -> Result<bool> {
        let mounted = ListView::render(&self.feed.engine(), self.skeleton_count).has_sentinel();
        if !mounted {
            self.sentinel.reset();
            return Ok(false);
        }
        if !self.sentinel.observe(visible) {
            return Ok(false);
        }

        let failed_next_page = matches!(
            self.feed.engine().state(),
            QueryState::Error {
                during: FetchKind::NextPage,
                ..
            }
        );
        if failed_next_page {
            debug!("Sentinel back in view, retrying failed page");
            self.feed.retry().await?;
            return Ok(true);
        }
        self.feed.load_more().await
    }

    /// Flip the archived flag of a listed recommendation.
    ///
    /// A declined or failed mutation leaves the list untouched and reports
    /// the failure toast.
    pub async fn toggle_archive(&mut self, id: &str) -> Result<Notification> {
        let archived = self
            .feed
            .engine()
            .items()
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.archived)
            .ok_or_else(|| {
                LeRecoError::validation_error(format!("Recommendation {} is not listed", id))
            })?;

        let target = !archived;
        match self.feed.set_archived(id, target).await {
            Ok(true) => Ok(Notification::updated(target)),
            Ok(false) => Ok(Notification::failed()),
            Err(e) => {
                warn!("Archive toggle for {} failed: {}", id, e);
                Ok(Notification::failed())
            }
        }
    }

    /// Repeat the fetch that last failed
    pub async fn retry(&mut self) -> Result<()> {
        self.feed.retry().await
    }

    /// The list, guarded by the error boundary
    pub fn list_view(&mut self) -> Rendered<ListView> {
        let engine = self.feed.engine();
        let skeleton_count = self.skeleton_count;
        self.boundary
            .render(|| ListView::render(&engine, skeleton_count))
    }

    /// Facet choices; `None` until the first page of the current key loads
    pub fn filter_panel(&self) -> Option<FilterPanel> {
        FilterPanel::build(self.feed.engine().available_tags(), &self.filters)
    }

    /// Text shown in the search box
    pub fn search_input(&self) -> &str {
        self.filters.search_input()
    }

    /// Label of the archive view toggle
    pub fn archive_view_label(&self) -> &'static str {
        if self.filters.archive_view() {
            "View Active"
        } else {
            "View Archived"
        }
    }
}
