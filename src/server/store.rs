//! In-memory recommendation store behind the stub API

use super::error::{ApiError, ApiResult};
use crate::types::{
    AuthResponse, AvailableTags, Class, CursorInfo, Framework, Impact, PaginatedResponse,
    Pagination, Provider, Recommendation, User,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// Page size used when the request names none
pub const DEFAULT_LIMIT: usize = 10;

/// Largest page the stub serves
pub const MAX_LIMIT: usize = 100;

/// Query string of `GET /recommendations`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    /// Offset cursor from a previous page
    pub cursor: Option<String>,

    /// Page size
    pub limit: Option<usize>,

    /// Case-insensitive match on title or description
    pub search: Option<String>,

    /// Comma-joined tags, all of which must match
    pub tags: Option<String>,

    /// Serve the archived partition
    pub archived: Option<bool>,
}

impl PageRequest {
    /// Individual tags, empty entries dropped
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// One request seen by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// HTTP method
    pub method: String,

    /// Request path
    pub path: String,

    /// Raw query string
    pub query: Option<String>,

    /// Whether a valid bearer token was presented
    pub authorized: bool,
}

/// Credentials the stub accepts and the token it issues for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoAccount {
    /// Accepted username
    pub username: String,

    /// Accepted password
    pub password: String,

    /// Token issued on login
    pub token: String,

    /// Profile returned on login
    pub user: User,
}

impl Default for DemoAccount {
    fn default() -> Self {
        Self {
            username: "u".to_string(),
            password: "p".to_string(),
            token: "t1".to_string(),
            user: User {
                id: "user-1".to_string(),
                email: "u@example.com".to_string(),
                name: "Demo User".to_string(),
            },
        }
    }
}

/// Shared state of the stub server
#[derive(Debug)]
pub struct StubStore {
    account: DemoAccount,
    items: Mutex<Vec<Recommendation>>,
    requests: Mutex<Vec<RequestRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubStore {
    /// Store holding `items`, accepting the default demo account
    pub fn new(items: Vec<Recommendation>) -> Self {
        Self::with_account(items, DemoAccount::default())
    }

    /// Store holding `items`, accepting `account`
    pub fn with_account(items: Vec<Recommendation>, account: DemoAccount) -> Self {
        Self {
            account,
            items: Mutex::new(items),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Store with the built-in sample data
    pub fn seeded() -> Self {
        Self::new(sample_recommendations())
    }

    /// Accepted account
    pub fn account(&self) -> &DemoAccount {
        &self.account
    }

    /// Check a login attempt
    pub fn login(&self, username: &str, password: &str) -> Option<AuthResponse> {
        (username == self.account.username && password == self.account.password).then(|| {
            AuthResponse {
                token: self.account.token.clone(),
                user: self.account.user.clone(),
            }
        })
    }

    /// Whether `token` was issued by this store
    pub fn is_valid_token(&self, token: &str) -> bool {
        !token.is_empty() && token == self.account.token
    }

    /// Append to the request log
    pub fn record(&self, request: RequestRecord) {
        lock(&self.requests).push(request);
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<RequestRecord> {
        lock(&self.requests).clone()
    }

    /// Snapshot of one recommendation
    pub fn get(&self, id: &str) -> Option<Recommendation> {
        lock(&self.items).iter().find(|r| r.id == id).cloned()
    }

    /// Set the archived flag. Idempotent; unknown ids are an error.
    pub fn set_archived(&self, id: &str, archived: bool) -> ApiResult<()> {
        let mut items = lock(&self.items);
        let item = items
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::not_found(format!("recommendation {}", id)))?;
        if item.archived != archived {
            item.archived = archived;
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Serve one page of the filtered partition
    pub fn page(&self, request: &PageRequest) -> ApiResult<PaginatedResponse<Recommendation>> {
        let offset = match request.cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| ApiError::bad_request(format!("Invalid cursor: {}", cursor)))?,
            None => 0,
        };
        let limit = request.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let matching: Vec<Recommendation> = lock(&self.items)
            .iter()
            .filter(|item| matches(item, request))
            .cloned()
            .collect();

        let start = offset.min(matching.len());
        let end = (start + limit).min(matching.len());
        let next = (end < matching.len()).then(|| end.to_string());
        let available_tags = (start == 0).then(|| facets(&matching));

        Ok(PaginatedResponse {
            data: matching[start..end].to_vec(),
            pagination: Pagination {
                cursor: CursorInfo { next },
                total_items: matching.len() as u64,
            },
            available_tags,
        })
    }
}

fn matches(item: &Recommendation, request: &PageRequest) -> bool {
    if item.archived != request.archived.unwrap_or(false) {
        return false;
    }

    if let Some(search) = request.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        if !item.title.to_lowercase().contains(&needle)
            && !item.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }

    request.tag_list().into_iter().all(|tag| has_tag(item, tag))
}

fn has_tag(item: &Recommendation, tag: &str) -> bool {
    item.providers.iter().any(|p| p.as_str() == tag)
        || item.class.as_str() == tag
        || item.frameworks.iter().any(|f| f.name == tag)
        || item.reasons.iter().any(|r| r == tag)
}

fn facets(items: &[Recommendation]) -> AvailableTags {
    let providers: BTreeSet<Provider> = items.iter().flat_map(|r| r.providers.iter().copied()).collect();
    let classes: BTreeSet<Class> = items.iter().map(|r| r.class).collect();
    let frameworks: BTreeSet<&str> = items
        .iter()
        .flat_map(|r| r.frameworks.iter().map(|f| f.name.as_str()))
        .collect();
    let reasons: BTreeSet<&str> = items
        .iter()
        .flat_map(|r| r.reasons.iter().map(String::as_str))
        .collect();

    AvailableTags {
        frameworks: frameworks.into_iter().map(str::to_string).collect(),
        reasons: reasons.into_iter().map(str::to_string).collect(),
        providers: providers.into_iter().collect(),
        classes: classes.into_iter().collect(),
    }
}

fn framework(id: &str, name: &str, version: &str) -> Framework {
    Framework {
        id: id.to_string(),
        name: name.to_string(),
        version: version.to_string(),
    }
}

/// Built-in sample data: a dozen recommendations across every provider and class
pub fn sample_recommendations() -> Vec<Recommendation> {
    let base = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default();

    let rows: [(&str, &str, &[Provider], Class, &[(&str, &str, &str)], &[&str], f64); 12] = [
        ("Enable MFA on root account", "The root account can sign in without a second factor.",
            &[Provider::Aws], Class::Critical, &[("cis-aws", "CIS AWS", "1.5")], &["identity"], 97.0),
        ("Block public S3 buckets", "Several buckets grant read access to everyone.",
            &[Provider::Aws], Class::Critical, &[("cis-aws", "CIS AWS", "1.5"), ("pci", "PCI DSS", "4.0")], &["data-exposure"], 94.5),
        ("Rotate service account keys", "User-managed keys are older than 90 days.",
            &[Provider::Gcp], Class::High, &[("cis-gcp", "CIS GCP", "2.0")], &["identity"], 81.0),
        ("Restrict SSH from the internet", "Firewall rules allow port 22 from 0.0.0.0/0.",
            &[Provider::Gcp, Provider::Azure], Class::High, &[("nist", "NIST 800-53", "5")], &["network"], 78.2),
        ("Enable storage encryption", "Storage accounts use platform keys without infrastructure encryption.",
            &[Provider::Azure], Class::Medium, &[("iso", "ISO 27001", "2022")], &["encryption"], 55.0),
        ("Turn on CloudTrail in all regions", "API activity in some regions is not logged.",
            &[Provider::Aws], Class::High, &[("cis-aws", "CIS AWS", "1.5"), ("soc2", "SOC 2", "2017")], &["logging"], 74.3),
        ("Disable legacy authentication", "Tenants still accept basic authentication protocols.",
            &[Provider::Azure], Class::Critical, &[("nist", "NIST 800-53", "5")], &["identity"], 91.1),
        ("Set bucket retention policies", "Audit log buckets have no retention lock.",
            &[Provider::Gcp], Class::Low, &[("soc2", "SOC 2", "2017")], &["logging"], 22.4),
        ("Tag untagged resources", "Resources without owner tags cannot be attributed.",
            &[Provider::Aws, Provider::Gcp, Provider::Azure], Class::Low, &[], &["governance"], 12.0),
        ("Enforce TLS 1.2 on load balancers", "Listeners still negotiate TLS 1.0.",
            &[Provider::Aws, Provider::Azure], Class::Medium, &[("pci", "PCI DSS", "4.0")], &["encryption"], 48.7),
        ("Enable VPC flow logs", "Network traffic in production VPCs is not captured.",
            &[Provider::Gcp], Class::Medium, &[("nist", "NIST 800-53", "5")], &["logging", "network"], 40.9),
        ("Review guest user access", "Guest users hold directory read permissions.",
            &[Provider::Azure], Class::Low, &[("iso", "ISO 27001", "2022")], &["identity"], 18.6),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (title, description, providers, class, frameworks, reasons, score))| {
            let created = base + Duration::days(i as i64);
            Recommendation {
                id: format!("rec-{:03}", i + 1),
                title: title.to_string(),
                description: description.to_string(),
                score: *score,
                providers: providers.to_vec(),
                frameworks: frameworks
                    .iter()
                    .map(|(id, name, version)| framework(id, name, version))
                    .collect(),
                reasons: reasons.iter().map(|r| r.to_string()).collect(),
                class: *class,
                impact: Impact {
                    violations_per_month: (score / 4.0).round(),
                    value_score: score / 10.0,
                },
                archived: false,
                created_at: created,
                updated_at: created,
            }
        })
        .collect()
}
