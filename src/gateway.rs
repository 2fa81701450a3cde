// API Gateway Client
//
// *La Passerelle* (The Gateway) - One call per remote capability, bearer token attached, uniform failure on non-2xx

use crate::auth::TokenSource;
use crate::config::ClientConfig;
use crate::errors::{LeRecoError, Result};
use crate::types::{
    ArchiveResponse, AuthResponse, Credentials, Page, PaginatedResponse, Recommendation,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Parameters of `GET /recommendations`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationParams {
    /// Continuation cursor; unset for the first page
    pub cursor: Option<String>,

    /// Page size
    pub limit: u32,

    /// Free-text search
    pub search: Option<String>,

    /// Selected facet tags, sent comma-joined in selection order
    pub tags: Vec<String>,

    /// Request the archived partition instead of the active one
    pub archived: bool,
}

impl RecommendationParams {
    /// Query-string fields in wire order. Absent or empty values are left out
    /// entirely so the server never filters on an empty string.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("cursor", cursor.to_string()));
        }
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if self.archived {
            pairs.push(("archived", "true".to_string()));
        }

        pairs
    }
}

/// Remote capabilities the client runtime depends on
#[allow(async_fn_in_trait)]
pub trait RecommendationApi {
    /// `POST /login`. Non-2xx fails with [`LeRecoError::Auth`].
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// `GET /recommendations`
    async fn fetch_recommendations(&self, params: &RecommendationParams) -> Result<Page>;

    /// `POST /recommendations/{id}/archive` or `/unarchive`, chosen by `archived`
    async fn set_archived(&self, id: &str, archived: bool) -> Result<ArchiveResponse>;
}

/// HTTP implementation of [`RecommendationApi`]
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Builds a client for the configured base URL.
    ///
    /// # Arguments
    /// * `config` - Client configuration (base URL and timeout are read)
    /// * `tokens` - Where the bearer token is read from on every call
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let base_url = Url::parse(config.api.base_url.trim()).map_err(|e| {
            LeRecoError::config_error(
                format!("Invalid API base URL {}: {}", config.api.base_url, e),
                Some("Set api.base_url or LERECO_API_URL.".to_string()),
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(LeRecoError::config_error(
                format!("API base URL cannot carry paths: {}", base_url),
                None,
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if config.api.timeout_secs > 0 {
            builder = builder.timeout(config.timeout());
        }
        let http = builder.build().map_err(|e| {
            LeRecoError::config_error(format!("Failed to build HTTP client: {}", e), None)
        })?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Base URL endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LeRecoError::config_error("API base URL cannot carry paths", None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token, send, and reject non-2xx responses
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.tokens.bearer_token() {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(LeRecoError::transport_error(status.as_u16(), status_text));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| LeRecoError::decode_error(endpoint, e.to_string()))
    }
}

impl RecommendationApi for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let url = self.endpoint(&["login"])?;
        let response = match self.send(self.http.post(url).json(credentials)).await {
            Ok(response) => response,
            Err(LeRecoError::Transport { status_text, .. }) => {
                return Err(LeRecoError::auth_error(status_text));
            }
            Err(e) => return Err(e),
        };
        Self::decode(response, "/login").await
    }

    async fn fetch_recommendations(&self, params: &RecommendationParams) -> Result<Page> {
        let url = self.endpoint(&["recommendations"])?;
        let request = self.http.get(url).query(&params.query_pairs());
        debug!(
            "Fetching recommendations (cursor: {:?}, tags: {:?})",
            params.cursor, params.tags
        );
        let response = self.send(request).await?;
        let page: PaginatedResponse<Recommendation> =
            Self::decode(response, "/recommendations").await?;
        Ok(Page::from(page))
    }

    async fn set_archived(&self, id: &str, archived: bool) -> Result<ArchiveResponse> {
        let action = if archived { "archive" } else { "unarchive" };
        let url = self.endpoint(&["recommendations", id, action])?;
        let response = self.send(self.http.post(url)).await?;
        Self::decode(response, &format!("/recommendations/{{id}}/{}", action)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct FixedToken(Option<&'static str>);

    impl TokenSource for FixedToken {
        fn bearer_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn client(base: &str) -> ApiClient {
        let mut config = ClientConfig::default();
        config.api.base_url = base.to_string();
        ApiClient::new(&config, Arc::new(FixedToken(None))).expect("client")
    }

    #[test]
    fn test_default_query_is_limit_only() {
        let params = RecommendationParams {
            limit: 10,
            ..Default::default()
        };
        assert_eq!(params.query_pairs(), vec![("limit", "10".to_string())]);
    }

    #[test]
    fn test_empty_optionals_are_omitted() {
        let params = RecommendationParams {
            cursor: Some(String::new()),
            limit: 10,
            search: Some(String::new()),
            tags: Vec::new(),
            archived: false,
        };
        let keys: Vec<_> = params.query_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["limit"]);
    }

    #[test]
    fn test_full_query_in_wire_order() {
        let params = RecommendationParams {
            cursor: Some("c2".to_string()),
            limit: 10,
            search: Some("mfa".to_string()),
            tags: vec!["AWS".to_string(), "Critical".to_string()],
            archived: true,
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("cursor", "c2".to_string()),
                ("limit", "10".to_string()),
                ("search", "mfa".to_string()),
                ("tags", "AWS,Critical".to_string()),
                ("archived", "true".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("http://api.test", &["login"], "http://api.test/login")]
    #[case("http://api.test/", &["recommendations"], "http://api.test/recommendations")]
    #[case("http://api.test/v1", &["recommendations", "a b", "archive"], "http://api.test/v1/recommendations/a%20b/archive")]
    #[case("http://api.test/v1/", &["recommendations", "x/y", "unarchive"], "http://api.test/v1/recommendations/x%2Fy/unarchive")]
    fn test_endpoint_resolution(#[case] base: &str, #[case] segments: &[&str], #[case] expected: &str) {
        let client = client(base);
        assert_eq!(client.endpoint(segments).expect("endpoint").as_str(), expected);
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".to_string();
        let result = ApiClient::new(&config, Arc::new(FixedToken(Some("t"))));
        assert!(matches!(result, Err(LeRecoError::Config { .. })));
    }
}
