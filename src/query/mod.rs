// Paginated Query Engine
//
// *La Requête* (The Query) - Cursor pagination keyed by filter state, with a structured cache

pub mod cache;
pub mod engine;
pub mod feed;
pub mod key;

pub use cache::{CacheKey, KeySegment, QueryCache};
pub use engine::{Completion, FetchKind, FetchTicket, PaginatedQuery, QueryState, ResultSet};
pub use feed::RecommendationFeed;
pub use key::{QueryKey, RECOMMENDATIONS_NAMESPACE};
