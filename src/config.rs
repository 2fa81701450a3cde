// Client Configuration
//
// *La Configuration* (The Configuration) - Settings for the recommendations client, from TOML or environment

use crate::errors::{LeRecoError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name inside the config directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Default API base URL (the stub server's default address)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:47270";

/// Default page size for recommendation queries
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Default search debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of skeleton placeholders while the first page loads
pub const DEFAULT_SKELETON_COUNT: usize = 3;

/// Default number of result sets kept in the query cache
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote API settings
    pub api: ApiConfig,

    /// Presentation settings
    pub ui: UiConfig,

    /// Query cache settings
    pub cache: CacheConfig,

    /// Durable storage settings
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from a file
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path to the TOML file
    ///
    /// # Returns
    ///
    /// `Result<ClientConfig>` - Loaded or default configuration
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            LeRecoError::config_error(
                format!("Failed to read config file {:?}: {}", config_path, e),
                None,
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            LeRecoError::config_error(
                format!("Failed to parse config file {:?}: {}", config_path, e),
                Some("Compare the file against the output of `lereco config --defaults`.".to_string()),
            )
        })
    }

    /// Save configuration to a file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LeRecoError::storage_error(
                    format!("Failed to create config directory: {}", e),
                    Some(parent.to_path_buf()),
                )
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            LeRecoError::config_error(format!("Failed to serialize configuration: {}", e), None)
        })?;

        fs::write(config_path, toml_string).map_err(|e| {
            LeRecoError::storage_error(
                format!("Failed to write config file: {}", e),
                Some(config_path.to_path_buf()),
            )
        })
    }

    /// Overlay environment variables onto this configuration
    ///
    /// Environment variables:
    /// - `LERECO_API_URL` - API base URL
    /// - `LERECO_PAGE_LIMIT` - Page size
    /// - `LERECO_TIMEOUT_SECS` - Request timeout
    /// - `LERECO_DEBOUNCE_MS` - Search debounce window
    /// - `LERECO_STORAGE_DIR` - Durable storage directory
    /// - `LERECO_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("LERECO_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(limit) = std::env::var("LERECO_PAGE_LIMIT") {
            if let Ok(limit) = limit.parse::<u32>() {
                self.api.page_limit = limit;
            }
        }

        if let Ok(timeout) = std::env::var("LERECO_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_secs = timeout;
            }
        }

        if let Ok(debounce) = std::env::var("LERECO_DEBOUNCE_MS") {
            if let Ok(debounce) = debounce.parse::<u64>() {
                self.ui.debounce_ms = debounce;
            }
        }

        if let Ok(dir) = std::env::var("LERECO_STORAGE_DIR") {
            self.storage.dir = Some(PathBuf::from(dir));
        }

        if let Ok(level) = std::env::var("LERECO_LOG_LEVEL") {
            self.logging.level = level;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LeRecoError::config_error(
                format!("API base URL must be an http(s) URL: {}", self.api.base_url),
                Some("Set api.base_url or LERECO_API_URL.".to_string()),
            ));
        }

        if self.api.page_limit == 0 {
            return Err(LeRecoError::config_error(
                "Page limit must be greater than zero",
                None,
            ));
        }

        if self.cache.capacity == 0 {
            return Err(LeRecoError::config_error(
                "Cache capacity must be greater than zero",
                None,
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(LeRecoError::config_error(
                    format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.logging.level
                    ),
                    None,
                ));
            }
        }

        Ok(())
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.ui.debounce_ms)
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Items requested per page
    pub page_limit: u32,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Quiescence window before a search edit is committed
    pub debounce_ms: u64,

    /// Placeholders shown while the first page is pending
    pub skeleton_count: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            skeleton_count: DEFAULT_SKELETON_COUNT,
        }
    }
}

/// Query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of result sets held
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding persisted records; the CLI defaults to `~/.lereco`
    pub dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for tracing
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
