//! HTTP handlers for the stub recommendations API

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, Uri},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::store::{PageRequest, RequestRecord, StubStore};
use crate::types::{ArchiveResponse, AuthResponse, Credentials, PaginatedResponse, Recommendation};

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Recommendations, accounts and the request log
    pub store: Arc<StubStore>,
}

impl AppState {
    /// Wrap a store
    pub fn new(store: Arc<StubStore>) -> Self {
        Self { store }
    }

    /// Log the request and report whether it carried a valid bearer token
    fn admit(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> bool {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| self.store.is_valid_token(token.trim()))
            .unwrap_or(false);

        self.store.record(RequestRecord {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            authorized,
        });
        authorized
    }

    fn require_bearer(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> ApiResult<()> {
        if self.admit(method, uri, headers) {
            Ok(())
        } else {
            Err(ApiError::unauthorized("Missing or invalid bearer token"))
        }
    }
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> ApiResult<Json<AuthResponse>> {
    state.admit(&method, &uri, &headers);
    match state.store.login(&credentials.username, &credentials.password) {
        Some(auth) => {
            info!("Issued token for {}", credentials.username);
            Ok(Json(auth))
        }
        None => Err(ApiError::unauthorized("Invalid credentials")),
    }
}

/// GET /recommendations
pub async fn list_recommendations(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(request): Query<PageRequest>,
) -> ApiResult<Json<PaginatedResponse<Recommendation>>> {
    state.require_bearer(&method, &uri, &headers)?;
    let page = state.store.page(&request)?;
    info!(
        "Serving {} of {} recommendation(s)",
        page.data.len(),
        page.pagination.total_items
    );
    Ok(Json(page))
}

/// POST /recommendations/:id/archive
pub async fn archive(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ArchiveResponse>> {
    set_archived(state, method, uri, headers, id, true)
}

/// POST /recommendations/:id/unarchive
pub async fn unarchive(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ArchiveResponse>> {
    set_archived(state, method, uri, headers, id, false)
}

fn set_archived(
    state: AppState,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    id: String,
    archived: bool,
) -> ApiResult<Json<ArchiveResponse>> {
    state.require_bearer(&method, &uri, &headers)?;
    state.store.set_archived(&id, archived)?;
    info!("Set archived={} on {}", archived, id);
    Ok(Json(ArchiveResponse { success: true }))
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lereco-stub",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/recommendations", get(list_recommendations))
        .route("/recommendations/:id/archive", post(archive))
        .route("/recommendations/:id/unarchive", post(unarchive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
