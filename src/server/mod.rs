// Stub Recommendations API
//
// *Le Bac à Sable* (The Sandbox) - Axum server implementing the recommendations API in memory, for local runs and integration tests

/// Error responses
pub mod error;

/// HTTP handlers
pub mod handlers;

/// In-memory data and request log
pub mod store;

pub use error::{ApiError, ApiResult};
pub use handlers::{create_router, AppState};
pub use store::{sample_recommendations, DemoAccount, PageRequest, RequestRecord, StubStore};

use crate::errors::{LeRecoError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Default host address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port number
pub const DEFAULT_PORT: u16 = 47270;

/// A bound, not yet serving, stub server.
///
/// Binding to port 0 picks an ephemeral port; [`StubServer::url`] reports it.
pub struct StubServer {
    listener: TcpListener,
    addr: SocketAddr,
    store: Arc<StubStore>,
}

impl StubServer {
    /// Bind `host:port` over `store`
    pub async fn bind(host: &str, port: u16, store: StubStore) -> Result<Self> {
        let requested = format!("{}:{}", host, port);
        let listener = TcpListener::bind(requested.as_str()).await.map_err(|e| {
            LeRecoError::network_error(format!("Failed to bind to {}: {}", requested, e))
        })?;
        let addr = listener.local_addr().map_err(|e| {
            LeRecoError::network_error(format!("Failed to read bound address: {}", e))
        })?;

        Ok(Self {
            listener,
            addr,
            store: Arc::new(store),
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL clients should use
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shared store, for inspecting requests and data
    pub fn store(&self) -> Arc<StubStore> {
        Arc::clone(&self.store)
    }

    /// Serve until the process stops
    pub async fn run(self) -> Result<()> {
        let app = create_router(AppState::new(self.store));
        info!("Stub API listening on: http://{}", self.addr);

        axum::serve(self.listener, app)
            .await
            .map_err(|e| LeRecoError::network_error(format!("Server error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = StubServer::bind(DEFAULT_HOST, 0, StubStore::seeded())
            .await
            .expect("bind");
        assert_ne!(server.local_addr().port(), 0);
        assert!(server.url().starts_with("http://127.0.0.1:"));
    }
}
