//! Shared fixtures for unit tests

use crate::errors::{LeRecoError, Result};
use crate::gateway::{RecommendationApi, RecommendationParams};
use crate::types::{
    ArchiveResponse, AuthResponse, AvailableTags, Class, Credentials, Impact, Page, Provider,
    Recommendation, User,
};
use chrono::{TimeZone, Utc};
use std::cell::{Cell, RefCell};

/// A low-severity AWS recommendation titled after its id
pub(crate) fn recommendation(id: &str) -> Recommendation {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Recommendation {
        id: id.to_string(),
        title: format!("Title {}", id),
        description: format!("Description of {}", id),
        score: 1.0,
        providers: vec![Provider::Aws],
        frameworks: Vec::new(),
        reasons: Vec::new(),
        class: Class::Low,
        impact: Impact {
            violations_per_month: 0.0,
            value_score: 0.0,
        },
        archived: false,
        created_at: ts,
        updated_at: ts,
    }
}

/// A page of fixture recommendations
pub(crate) fn page(ids: &[&str], next: Option<&str>) -> Page {
    Page {
        items: ids.iter().map(|id| recommendation(id)).collect(),
        next_cursor: next.map(str::to_string),
        total_items: ids.len() as u64,
        available_tags: None,
    }
}

/// In-process stand-in for the remote API.
///
/// Filters by archive partition, case-insensitive title search and
/// conjunctive provider/class tags; paginates by offset cursors. Every call
/// yields once before answering so joined futures interleave.
#[derive(Default)]
pub(crate) struct FakeApi {
    items: RefCell<Vec<Recommendation>>,
    calls: RefCell<Vec<RecommendationParams>>,
    failure: RefCell<Option<LeRecoError>>,
    fetch_failure: RefCell<Option<LeRecoError>>,
    decline: Cell<bool>,
}

impl FakeApi {
    pub(crate) fn with_items(items: Vec<Recommendation>) -> Self {
        Self {
            items: RefCell::new(items),
            ..Default::default()
        }
    }

    pub(crate) fn push(&mut self, item: Recommendation) {
        self.items.get_mut().push(item);
    }

    /// Fetch parameters received so far
    pub(crate) fn calls(&self) -> Vec<RecommendationParams> {
        self.calls.borrow().clone()
    }

    /// Make the next call of any kind fail with `error`
    pub(crate) fn fail_next(&self, error: LeRecoError) {
        *self.failure.borrow_mut() = Some(error);
    }

    /// Make the next list fetch fail with `error`; other calls are unaffected
    pub(crate) fn fail_next_fetch(&self, error: LeRecoError) {
        *self.fetch_failure.borrow_mut() = Some(error);
    }

    /// Answer archive calls with `success: false`
    pub(crate) fn decline_archive(&self) {
        self.decline.set(true);
    }

    fn take_failure(&self) -> Result<()> {
        match self.failure.borrow_mut().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn matches(item: &Recommendation, params: &RecommendationParams) -> bool {
        if item.archived != params.archived {
            return false;
        }
        if let Some(search) = &params.search {
            if !item.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        params.tags.iter().all(|tag| {
            item.providers.iter().any(|p| p.as_str() == tag) || item.class.as_str() == tag
        })
    }
}

impl RecommendationApi for FakeApi {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse> {
        tokio::task::yield_now().await;
        self.take_failure()?;
        if credentials.username == "u" && credentials.password == "p" {
            Ok(AuthResponse {
                token: "t1".to_string(),
                user: User {
                    id: "1".to_string(),
                    email: "u@example.test".to_string(),
                    name: "U".to_string(),
                },
            })
        } else {
            Err(LeRecoError::auth_error("Unauthorized"))
        }
    }

    async fn fetch_recommendations(&self, params: &RecommendationParams) -> Result<Page> {
        self.calls.borrow_mut().push(params.clone());
        tokio::task::yield_now().await;
        self.take_failure()?;
        if let Some(e) = self.fetch_failure.borrow_mut().take() {
            return Err(e);
        }

        let matching: Vec<Recommendation> = self
            .items
            .borrow()
            .iter()
            .filter(|item| Self::matches(item, params))
            .cloned()
            .collect();

        let offset: usize = params
            .cursor
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let limit = params.limit.max(1) as usize;
        let end = (offset + limit).min(matching.len());
        let next_cursor = (end < matching.len()).then(|| end.to_string());

        let available_tags = (offset == 0).then(|| AvailableTags {
            providers: vec![Provider::Aws, Provider::Gcp],
            classes: vec![Class::Critical, Class::Low],
            frameworks: vec!["CIS".to_string()],
            reasons: Vec::new(),
        });

        Ok(Page {
            items: matching[offset.min(end)..end].to_vec(),
            next_cursor,
            total_items: matching.len() as u64,
            available_tags,
        })
    }

    async fn set_archived(&self, id: &str, archived: bool) -> Result<ArchiveResponse> {
        tokio::task::yield_now().await;
        self.take_failure()?;
        if self.decline.get() {
            return Ok(ArchiveResponse { success: false });
        }

        let mut items = self.items.borrow_mut();
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.archived = archived;
                Ok(ArchiveResponse { success: true })
            }
            None => Err(LeRecoError::transport_error(404, "Not Found")),
        }
    }
}
