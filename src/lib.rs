// lereco - Security Recommendation Triage
//
// *Le Reco* (The Recommendation) - Paginated retrieval, filtering and archiving of security recommendations

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Client runtime for a security-recommendation dashboard.
//!
//! The API client, paginated query engine, filter composition and persisted
//! login live here as a headless library; the `lereco` binary and the stub
//! API server sit behind the `cli` and `stub-server` features.

pub mod auth;
pub mod boundary;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod errors;
pub mod filter;
pub mod gateway;
pub mod list;
pub mod logging;
pub mod query;
pub mod storage;
pub mod types;

/// Command-line front end
#[cfg(feature = "cli")]
pub mod cli;

/// In-memory recommendations API
#[cfg(feature = "stub-server")]
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{guard, AuthState, AuthStore, RouteDecision, TokenSource};
pub use config::ClientConfig;
pub use dashboard::Dashboard;
pub use errors::{LeRecoError, Result};
pub use gateway::{ApiClient, RecommendationApi, RecommendationParams};
pub use query::{PaginatedQuery, QueryKey, RecommendationFeed};
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use types::{AvailableTags, Class, Page, Provider, Recommendation};
