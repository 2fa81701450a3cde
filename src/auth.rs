// Persisted Auth State
//
// *L'Authentification* (The Authentication) - Login state saved under a fixed storage key, and the route guard that reads it

use crate::errors::{LeRecoError, Result};
use crate::gateway::RecommendationApi;
use crate::storage::DurableStorage;
use crate::types::{AuthResponse, Credentials, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key the auth record lives under
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// Persisted record format version
const AUTH_RECORD_VERSION: u32 = 0;

/// Login state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    /// Logged-in user
    pub user: Option<User>,

    /// Bearer token
    pub token: Option<String>,

    /// Whether a login has succeeded since the last logout
    pub is_authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedAuth {
    state: AuthState,
    #[serde(default)]
    version: u32,
}

/// Supplies the bearer credential for outgoing requests.
///
/// Read on every call, never cached by the caller.
pub trait TokenSource: Send + Sync {
    /// Current token, if any
    fn bearer_token(&self) -> Option<String>;
}

/// Auth state store backed by durable storage
#[derive(Clone)]
pub struct AuthStore {
    storage: Arc<dyn DurableStorage>,
}

impl AuthStore {
    /// Create a store over the given storage
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// Read the persisted state.
    ///
    /// A missing, unreadable or corrupt record reads as logged out. A corrupt
    /// record is deleted.
    pub fn state(&self) -> AuthState {
        let raw = match self.storage.get(AUTH_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AuthState::default(),
            Err(e) => {
                warn!("Failed to read auth record: {}", e);
                return AuthState::default();
            }
        };

        match serde_json::from_str::<PersistedAuth>(&raw) {
            Ok(record) => record.state,
            Err(e) => {
                warn!("Dropping corrupt auth record: {}", e);
                if let Err(e) = self.storage.remove(AUTH_STORAGE_KEY) {
                    warn!("Failed to remove corrupt auth record: {}", e);
                }
                AuthState::default()
            }
        }
    }

    /// Persisted token, if any
    pub fn token(&self) -> Option<String> {
        self.state().token.filter(|t| !t.is_empty())
    }

    /// Record a successful login
    pub fn set_auth(&self, auth: &AuthResponse) -> Result<()> {
        self.write(AuthState {
            user: Some(auth.user.clone()),
            token: Some(auth.token.clone()),
            is_authenticated: true,
        })
    }

    /// Clear the login state
    pub fn logout(&self) -> Result<()> {
        self.write(AuthState::default())
    }

    fn write(&self, state: AuthState) -> Result<()> {
        let record = PersistedAuth {
            state,
            version: AUTH_RECORD_VERSION,
        };
        let json = serde_json::to_string(&record).map_err(|e| {
            LeRecoError::storage_error(format!("Failed to encode auth record: {}", e), None)
        })?;
        self.storage.set(AUTH_STORAGE_KEY, &json)
    }
}

impl TokenSource for AuthStore {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

/// Outcome of the route guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// A token is persisted; the protected view may render
    Allow {
        /// The persisted token
        token: String,
    },

    /// No token; send the user to the login view
    RedirectToLogin,
}

/// Gate a protected view on the persisted token
pub fn guard(store: &AuthStore) -> RouteDecision {
    match store.token() {
        Some(token) => RouteDecision::Allow { token },
        None => RouteDecision::RedirectToLogin,
    }
}

/// Validate credentials, authenticate, and persist the result.
///
/// Nothing is persisted when validation or authentication fails.
pub async fn login<A: RecommendationApi>(
    api: &A,
    store: &AuthStore,
    credentials: &Credentials,
) -> Result<AuthResponse> {
    if credentials.username.trim().is_empty() {
        return Err(LeRecoError::validation_error("Username is required"));
    }
    if credentials.password.is_empty() {
        return Err(LeRecoError::validation_error("Password is required"));
    }

    let auth = api.authenticate(credentials).await?;
    store.set_auth(&auth)?;
    info!("Logged in as {}", auth.user.email);
    Ok(auth)
}

/// Clear the persisted login
pub fn logout(store: &AuthStore) -> Result<()> {
    store.logout()?;
    info!("Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn sample_auth() -> AuthResponse {
        AuthResponse {
            token: "t1".to_string(),
            user: User {
                id: "1".to_string(),
                email: "u@example.test".to_string(),
                name: "U".to_string(),
            },
        }
    }

    #[test]
    fn test_fresh_store_is_logged_out() {
        let store = AuthStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(store.state(), AuthState::default());
        assert_eq!(guard(&store), RouteDecision::RedirectToLogin);
    }

    #[test]
    fn test_set_auth_persists_record_shape() {
        let storage = Arc::new(MemoryStorage::new());
        let store = AuthStore::new(storage.clone());
        store.set_auth(&sample_auth()).expect("set");

        let raw = storage.get(AUTH_STORAGE_KEY).expect("get").expect("present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["state"]["token"], "t1");
        assert_eq!(value["state"]["isAuthenticated"], true);
        assert_eq!(value["state"]["user"]["email"], "u@example.test");

        assert_eq!(
            guard(&store),
            RouteDecision::Allow {
                token: "t1".to_string()
            }
        );
    }

    #[test]
    fn test_logout_clears_state() {
        let store = AuthStore::new(Arc::new(MemoryStorage::new()));
        store.set_auth(&sample_auth()).expect("set");
        logout(&store).expect("logout");

        let state = store.state();
        assert!(!state.is_authenticated);
        assert!(state.token.is_none());
        assert!(state.user.is_none());
        assert_eq!(guard(&store), RouteDecision::RedirectToLogin);
    }

    #[test]
    fn test_corrupt_record_reads_as_logged_out() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(AUTH_STORAGE_KEY, "{not json").expect("set");
        let store = AuthStore::new(storage.clone());
        assert_eq!(store.state(), AuthState::default());
        assert_eq!(storage.get(AUTH_STORAGE_KEY).expect("get"), None);
    }

    #[test]
    fn test_token_is_read_at_call_time() {
        let storage = Arc::new(MemoryStorage::new());
        let store = AuthStore::new(storage.clone());
        let source: &dyn TokenSource = &store;
        assert_eq!(source.bearer_token(), None);

        // A second handle over the same storage sees the write immediately
        AuthStore::new(storage).set_auth(&sample_auth()).expect("set");
        assert_eq!(source.bearer_token().as_deref(), Some("t1"));
    }
}
