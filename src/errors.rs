// Error Handling
//
// *La Gestion des Erreurs* (The Error Management) - Error taxonomy for the recommendations client

use std::path::PathBuf;
use thiserror::Error;

/// Result type for LeReco operations
pub type Result<T> = std::result::Result<T, LeRecoError>;

/// LeReco error types
#[derive(Debug, Clone, Error)]
pub enum LeRecoError {
    /// Login was rejected by the server
    #[error("Authentication failed: {message}")]
    Auth {
        message: String,
    },

    /// Any non-2xx response. Callers only ever see the status text.
    #[error("API Error: {status_text}")]
    Transport {
        status: u16,
        status_text: String,
    },

    /// The request never produced a response (DNS, connect, timeout)
    #[error("Network error: {message}")]
    Network {
        message: String,
    },

    /// Response body did not match the expected schema
    #[error("Decode error on {endpoint}: {message}")]
    Decode {
        endpoint: String,
        message: String,
    },

    /// Durable storage could not be read or written
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        path: Option<PathBuf>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        suggestion: Option<String>,
    },

    /// Input rejected before any request was made
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// No persisted token; the caller must log in first
    #[error("Not authenticated")]
    Unauthenticated,

    /// A render closure panicked inside an error boundary
    #[error("Render error: {message}")]
    Render {
        message: String,
    },
}

impl LeRecoError {
    /// Create an authentication error
    pub fn auth_error(message: impl Into<String>) -> Self {
        LeRecoError::Auth {
            message: message.into(),
        }
    }

    /// Create a transport error from an HTTP status
    pub fn transport_error(status: u16, status_text: impl Into<String>) -> Self {
        LeRecoError::Transport {
            status,
            status_text: status_text.into(),
        }
    }

    /// Create a network error
    pub fn network_error(message: impl Into<String>) -> Self {
        LeRecoError::Network {
            message: message.into(),
        }
    }

    /// Create a decode error for an endpoint
    pub fn decode_error(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        LeRecoError::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        LeRecoError::Storage {
            message: message.into(),
            path,
        }
    }

    /// Create a config error
    pub fn config_error(message: impl Into<String>, suggestion: Option<String>) -> Self {
        LeRecoError::Config {
            message: message.into(),
            suggestion,
        }
    }

    /// Create a validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        LeRecoError::Validation {
            message: message.into(),
        }
    }

    /// Create a render error
    pub fn render_error(message: impl Into<String>) -> Self {
        LeRecoError::Render {
            message: message.into(),
        }
    }

    /// Whether repeating the same user gesture may succeed.
    ///
    /// Nothing is retried automatically; this only drives the hint shown to the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LeRecoError::Transport { .. } | LeRecoError::Network { .. }
        )
    }

    /// Get user-friendly suggestion for recovery
    pub fn suggestion(&self) -> Option<String> {
        match self {
            LeRecoError::Config { suggestion, .. } => suggestion.clone(),
            LeRecoError::Auth { .. } => {
                Some("Check your username and password and try again.".to_string())
            }
            LeRecoError::Unauthenticated => Some("Run 'lereco login' first.".to_string()),
            LeRecoError::Transport { status: 401, .. } => {
                Some("Your session may have expired. Run 'lereco login' again.".to_string())
            }
            LeRecoError::Transport { .. } | LeRecoError::Network { .. } => {
                Some("Repeat the action to try again.".to_string())
            }
            LeRecoError::Storage { .. } => {
                Some("Check permissions on the storage directory.".to_string())
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LeRecoError {
    fn from(err: reqwest::Error) -> Self {
        LeRecoError::network_error(err.to_string())
    }
}

/// Format error for user display
///
/// # Arguments
///
/// * `error` - The error to format
///
/// # Returns
///
/// Formatted error message with suggestions
pub fn format_error(error: &LeRecoError) -> String {
    let mut message = format!("Error: {}", error);

    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    if let LeRecoError::Storage { path: Some(p), .. } = error {
        message.push_str(&format!("\n\nPath: {:?}", p));
    }

    message
}
