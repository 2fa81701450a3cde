//! Client runtime against the stub API over real HTTP

use lereco::auth::{self, AuthStore, AUTH_STORAGE_KEY};
use lereco::boundary::Rendered;
use lereco::config::ClientConfig;
use lereco::dashboard::Dashboard;
use lereco::gateway::{ApiClient, RecommendationApi, RecommendationParams};
use lereco::list::{Footer, ListView};
use lereco::server::{sample_recommendations, RequestRecord, StubServer, StubStore};
use lereco::storage::{DurableStorage, FileStorage};
use lereco::types::Credentials;
use lereco::LeRecoError;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    storage: Arc<FileStorage>,
    auth: AuthStore,
    config: ClientConfig,
    stub: Arc<StubStore>,
}

impl Harness {
    async fn start(store: StubStore) -> Self {
        let server = StubServer::bind("127.0.0.1", 0, store).await.expect("bind");
        let mut config = ClientConfig::default();
        config.api.base_url = server.url();
        let stub = server.store();
        tokio::spawn(server.run());

        let dir = TempDir::new().expect("tempdir");
        let storage = Arc::new(FileStorage::new(dir.path()));
        let auth = AuthStore::new(storage.clone());
        Self {
            _dir: dir,
            storage,
            auth,
            config,
            stub,
        }
    }

    fn api(&self) -> ApiClient {
        ApiClient::new(&self.config, Arc::new(self.auth.clone())).expect("client")
    }

    async fn login(&self) {
        auth::login(&self.api(), &self.auth, &Credentials::new("u", "p"))
            .await
            .expect("login");
    }

    fn recommendation_requests(&self) -> Vec<RequestRecord> {
        self.stub
            .requests()
            .into_iter()
            .filter(|r| r.path == "/recommendations")
            .collect()
    }
}

fn query_value(record: &RequestRecord, name: &str) -> Option<String> {
    let raw = record.query.as_deref().unwrap_or_default();
    let url = reqwest::Url::parse(&format!("http://stub/?{}", raw)).expect("url");
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn card_ids(dashboard: &mut Dashboard<ApiClient>) -> Vec<String> {
    match dashboard.list_view() {
        Rendered::View(view) => view.cards().iter().map(|c| c.id.clone()).collect(),
        Rendered::Fallback(f) => panic!("boundary tripped: {:?}", f),
    }
}

#[tokio::test]
async fn test_login_then_default_listing() {
    let items = sample_recommendations().into_iter().take(3).collect();
    let harness = Harness::start(StubStore::new(items)).await;
    harness.login().await;

    let raw = harness
        .storage
        .get(AUTH_STORAGE_KEY)
        .expect("read")
        .expect("record persisted");
    let record: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(record["state"]["token"], "t1");
    assert_eq!(record["state"]["isAuthenticated"], true);

    let mut dashboard = Dashboard::open(harness.api(), &harness.auth, &harness.config)
        .await
        .expect("open");

    let requests = harness.recommendation_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].query.as_deref(), Some("limit=10"));
    assert!(requests[0].authorized);

    match dashboard.list_view() {
        Rendered::View(ListView::Items { cards, footer }) => {
            assert_eq!(cards.len(), 3);
            assert_eq!(footer, Footer::End);
        }
        other => panic!("unexpected view: {:?}", other),
    }
}

#[tokio::test]
async fn test_tag_selection_reaches_the_wire_in_order() {
    let harness = Harness::start(StubStore::seeded()).await;
    harness.login().await;
    let mut dashboard = Dashboard::open(harness.api(), &harness.auth, &harness.config)
        .await
        .expect("open");

    dashboard.toggle_tag("AWS").await.expect("aws");
    dashboard.toggle_tag("Critical").await.expect("critical");

    let requests = harness.recommendation_requests();
    let last = requests.last().expect("request");
    assert_eq!(query_value(last, "tags").as_deref(), Some("AWS,Critical"));
    assert_eq!(query_value(last, "limit").as_deref(), Some("10"));
    assert_eq!(query_value(last, "cursor"), None);
    assert_eq!(card_ids(&mut dashboard), vec!["rec-001", "rec-002"]);
}

#[tokio::test]
async fn test_pagination_and_archive_round_trip() {
    let harness = Harness::start(StubStore::seeded()).await;
    harness.login().await;
    let mut dashboard = Dashboard::open(harness.api(), &harness.auth, &harness.config)
        .await
        .expect("open");
    assert_eq!(card_ids(&mut dashboard).len(), 10);

    assert!(dashboard.sentinel_visibility(true).await.expect("load more"));
    assert_eq!(card_ids(&mut dashboard).len(), 12);
    let last = harness.recommendation_requests().pop().expect("request");
    assert_eq!(query_value(&last, "cursor").as_deref(), Some("10"));

    let note = dashboard.toggle_archive("rec-001").await.expect("archive");
    assert_eq!(note.title, "Recommendation archived");
    let active = card_ids(&mut dashboard);
    assert!(!active.contains(&"rec-001".to_string()));
    assert_eq!(active.len(), 10, "refetched from page 1");

    dashboard.toggle_archive_view().await.expect("archived view");
    assert_eq!(card_ids(&mut dashboard), vec!["rec-001"]);
    let last = harness.recommendation_requests().pop().expect("request");
    assert_eq!(query_value(&last, "archived").as_deref(), Some("true"));

    let note = dashboard.toggle_archive("rec-001").await.expect("unarchive");
    assert_eq!(note.title, "Recommendation unarchived");
    assert!(card_ids(&mut dashboard).is_empty());

    dashboard.toggle_archive_view().await.expect("active view");
    assert_eq!(card_ids(&mut dashboard)[0], "rec-001");
}

#[tokio::test]
async fn test_bad_credentials_persist_nothing() {
    let harness = Harness::start(StubStore::seeded()).await;
    let err = auth::login(&harness.api(), &harness.auth, &Credentials::new("u", "wrong"))
        .await
        .expect_err("rejected");

    assert!(matches!(err, LeRecoError::Auth { .. }));
    assert_eq!(harness.storage.get(AUTH_STORAGE_KEY).expect("read"), None);

    let result = Dashboard::open(harness.api(), &harness.auth, &harness.config).await;
    assert!(matches!(result, Err(LeRecoError::Unauthenticated)));
}

#[tokio::test]
async fn test_missing_token_is_a_transport_error() {
    let harness = Harness::start(StubStore::seeded()).await;
    let params = RecommendationParams {
        limit: 10,
        ..Default::default()
    };
    let err = harness
        .api()
        .fetch_recommendations(&params)
        .await
        .expect_err("unauthorized");
    assert_eq!(err.to_string(), "API Error: Unauthorized");
}

#[tokio::test]
async fn test_logout_clears_token() {
    let harness = Harness::start(StubStore::seeded()).await;
    harness.login().await;
    auth::logout(&harness.auth).expect("logout");

    assert_eq!(harness.auth.token(), None);
    let state = harness.auth.state();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
}
