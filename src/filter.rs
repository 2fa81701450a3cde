// Filter and Search Composition
//
// *Le Filtre* (The Filter) - Derives the active query key from search text, tag facets and the archive toggle

use crate::query::QueryKey;
use crate::types::AvailableTags;
use serde::Serialize;

/// User-controlled filter inputs.
///
/// `search_input` is what the search box shows and follows every keystroke;
/// `search` is the debounced value that actually feeds the query key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    search_input: String,
    search: String,
    selected_tags: Vec<String>,
    archive_view: bool,
}

impl FilterState {
    /// Empty filters on the active view
    pub fn new() -> Self {
        Self::default()
    }

    /// Text currently shown in the search box
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Committed search text
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Selected tags in selection order
    pub fn selected_tags(&self) -> &[String] {
        &self.selected_tags
    }

    /// Whether the archived partition is shown
    pub fn archive_view(&self) -> bool {
        self.archive_view
    }

    /// Update the visible search text without touching the query
    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.search_input = text.into();
    }

    /// Commit a debounced search value. Returns whether it changed.
    pub fn commit_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.search {
            return false;
        }
        self.search = text;
        true
    }

    /// Add `tag` if absent, remove it if present. Tags never exclude each other.
    pub fn toggle_tag(&mut self, tag: &str) {
        match self.selected_tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.selected_tags.remove(index);
            }
            None => self.selected_tags.push(tag.to_string()),
        }
    }

    /// Whether `tag` is selected
    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected_tags.iter().any(|t| t == tag)
    }

    /// Switch between the active and archived partitions
    pub fn toggle_archive_view(&mut self) {
        self.archive_view = !self.archive_view;
    }

    /// Query key for the current committed filters
    pub fn query_key(&self) -> QueryKey {
        QueryKey::new(self.search.clone(), &self.selected_tags, self.archive_view)
    }
}

/// One selectable value in a facet group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    /// Tag value sent to the server
    pub value: String,

    /// Whether it is currently selected
    pub selected: bool,
}

/// A titled group of facet values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetGroup {
    /// Group heading
    pub title: &'static str,

    /// Values in server order
    pub options: Vec<FacetOption>,
}

/// Filter choices for the current result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPanel {
    /// Providers, risk levels and frameworks, in that order
    pub groups: Vec<FacetGroup>,
}

impl FilterPanel {
    /// Build the panel from the first page's facet vocabulary.
    ///
    /// `None` until that page has loaded.
    pub fn build(available: Option<&AvailableTags>, filters: &FilterState) -> Option<Self> {
        let available = available?;

        let group = |title: &'static str, values: Vec<String>| FacetGroup {
            title,
            options: values
                .into_iter()
                .map(|value| FacetOption {
                    selected: filters.is_selected(&value),
                    value,
                })
                .collect(),
        };

        Some(Self {
            groups: vec![
                group(
                    "Cloud Providers",
                    available.providers.iter().map(|p| p.as_str().to_string()).collect(),
                ),
                group(
                    "Risk Level",
                    available.classes.iter().map(|c| c.as_str().to_string()).collect(),
                ),
                group("Frameworks", available.frameworks.clone()),
            ],
        })
    }

    /// Look up a group by heading
    pub fn group(&self, title: &str) -> Option<&FacetGroup> {
        self.groups.iter().find(|g| g.title == title)
    }
}
