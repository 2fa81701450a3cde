//! Query keys: the user-controlled parameters identifying one result set

use crate::gateway::RecommendationParams;
use crate::query::cache::{CacheKey, KeySegment};
use std::hash::{Hash, Hasher};

/// Cache namespace shared by every recommendation query
pub const RECOMMENDATIONS_NAMESPACE: &str = "recommendations";

/// `(search, selected tags, archive view)`.
///
/// Compared by value. Tags are a set for identity purposes, but their
/// selection order is kept because it is the order they go on the wire.
#[derive(Debug, Clone, Default)]
pub struct QueryKey {
    search: String,
    tags: Vec<String>,
    archive_view: bool,
}

impl QueryKey {
    /// Build a key; duplicate tags are dropped, first occurrence wins
    pub fn new(search: impl Into<String>, tags: &[String], archive_view: bool) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique.contains(tag) {
                unique.push(tag.clone());
            }
        }
        Self {
            search: search.into(),
            tags: unique,
            archive_view,
        }
    }

    /// Committed search text
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Selected tags in selection order
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether this key selects the archived partition
    pub fn archive_view(&self) -> bool {
        self.archive_view
    }

    fn sorted_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Structured cache key: namespace, search, tags (sorted), view
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::namespace(RECOMMENDATIONS_NAMESPACE)
            .with(KeySegment::Search(self.search.clone()))
            .with(KeySegment::Tags(
                self.sorted_tags().into_iter().map(str::to_string).collect(),
            ))
            .with(KeySegment::ArchiveView(self.archive_view))
    }

    /// Request parameters for a page of this key
    pub fn params(&self, cursor: Option<String>, limit: u32) -> RecommendationParams {
        RecommendationParams {
            cursor,
            limit,
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
            tags: self.tags.clone(),
            archived: self.archive_view,
        }
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.search == other.search
            && self.archive_view == other.archive_view
            && self.sorted_tags() == other.sorted_tags()
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.search.hash(state);
        self.sorted_tags().hash(state);
        self.archive_view.hash(state);
    }
}
