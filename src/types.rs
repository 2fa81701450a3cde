// Data Model
//
// *Les Données* (The Data) - Recommendation records and page envelopes exchanged with the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cloud provider a recommendation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    /// Amazon Web Services
    #[serde(rename = "AWS")]
    Aws,

    /// Google Cloud Platform
    #[serde(rename = "GCP")]
    Gcp,

    /// Microsoft Azure
    #[serde(rename = "Azure")]
    Azure,
}

impl Provider {
    /// All providers in display order
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Gcp, Provider::Azure];

    /// Wire and tag representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Gcp => "GCP",
            Provider::Azure => "Azure",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

/// Severity class. Variants are declared from most to least severe, so the
/// derived ordering sorts critical items first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Class {
    /// Critical severity
    Critical,

    /// High severity
    High,

    /// Medium severity
    Medium,

    /// Low severity
    Low,
}

impl Class {
    /// All classes, most severe first
    pub const ALL: [Class; 4] = [Class::Critical, Class::High, Class::Medium, Class::Low];

    /// Wire and tag representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Class::Critical => "Critical",
            Class::High => "High",
            Class::Medium => "Medium",
            Class::Low => "Low",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Class {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Class::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown class: {}", s))
    }
}

/// Compliance framework reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    /// Framework identifier
    pub id: String,

    /// Display name, also used as a filter tag
    pub name: String,

    /// Framework version
    pub version: String,
}

/// Estimated impact of applying a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    /// Policy violations observed per month
    pub violations_per_month: f64,

    /// Server-computed value score
    pub value_score: f64,
}

/// A single security recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Stable identity across pages and archive toggles
    #[serde(rename = "recommendationId")]
    pub id: String,

    /// Display title
    pub title: String,

    /// Display description
    pub description: String,

    /// Ranking score
    pub score: f64,

    /// Providers this applies to
    pub providers: Vec<Provider>,

    /// Frameworks this maps to, in server order
    pub frameworks: Vec<Framework>,

    /// Reasons the recommendation was raised
    #[serde(default)]
    pub reasons: Vec<String>,

    /// Severity class
    pub class: Class,

    /// Impact estimate
    pub impact: Impact,

    /// The only field this client mutates
    pub archived: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Facet vocabulary for the current filter state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableTags {
    /// Framework names
    #[serde(default)]
    pub frameworks: Vec<String>,

    /// Reasons
    #[serde(default)]
    pub reasons: Vec<String>,

    /// Providers
    #[serde(default)]
    pub providers: Vec<Provider>,

    /// Severity classes
    #[serde(default)]
    pub classes: Vec<Class>,
}

/// Continuation cursor envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorInfo {
    /// Opaque token for the next page, `None` at the end of the result set
    pub next: Option<String>,
}

/// Pagination envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Cursor block
    pub cursor: CursorInfo,

    /// Total items matching the query
    pub total_items: u64,
}

/// Wire shape of `GET /recommendations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items on this page
    pub data: Vec<T>,

    /// Pagination block
    pub pagination: Pagination,

    /// Facet vocabulary, first page only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tags: Option<AvailableTags>,
}

/// One fetched page, as held by the query engine
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Items in server order
    pub items: Vec<Recommendation>,

    /// Cursor for the following page
    pub next_cursor: Option<String>,

    /// Total matching items reported by the server
    pub total_items: u64,

    /// Facet vocabulary (first page only)
    pub available_tags: Option<AvailableTags>,
}

impl From<PaginatedResponse<Recommendation>> for Page {
    fn from(response: PaginatedResponse<Recommendation>) -> Self {
        // An empty-string cursor means "no further pages" for some servers
        let next_cursor = response.pagination.cursor.next.filter(|c| !c.is_empty());
        Self {
            items: response.data,
            next_cursor,
            total_items: response.pagination.total_items,
            available_tags: response.available_tags,
        }
    }
}

/// Authenticated user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,

    /// Email address
    pub email: String,

    /// Display name
    pub name: String,
}

/// Response of `POST /login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,

    /// Logged-in user
    pub user: User,
}

/// Login request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Response of the archive and unarchive endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveResponse {
    /// Whether the server applied the change
    pub success: bool,
}
