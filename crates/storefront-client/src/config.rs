//! # Client Configuration
//!
//! Configuration management for the storefront client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_BASE_URL=https://pos.example.com                        │
//! │     STOREFRONT_TOKEN=eyJhbGciOi...                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/storefront.toml (Linux)                       │
//! │     ~/Library/Application Support/com.storefront.pos/... (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8080, HQ context, read-only                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [server]
//! base_url = "https://pos.example.com"
//! token = "eyJhbGciOi..."
//! timeout_secs = 15
//!
//! [retry]
//! initial_backoff_ms = 250
//! max_backoff_secs = 5
//! max_elapsed_secs = 20
//!
//! [session]
//! initial_store = "hq"   # or a store id such as "3"
//! can_edit = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storefront_core::{Capabilities, StoreContext};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Server Settings
// =============================================================================

/// Where the storefront service lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Service root, without the `/api/v1` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token attached to every request.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Backoff for idempotent reads. Submissions ignore these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// First retry delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Longest single delay (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    /// Give up after this much total time (seconds). 0 disables retries.
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_secs: u64,
}

fn default_initial_backoff() -> u64 {
    250
}
fn default_max_backoff() -> u64 {
    5
}
fn default_max_elapsed() -> u64 {
    20
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            max_elapsed_secs: default_max_elapsed(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

/// How a new session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// `hq` or a numeric store id.
    #[serde(default = "default_initial_store")]
    pub initial_store: String,

    /// Whether the operator may author catalog entries.
    #[serde(default)]
    pub can_edit: bool,
}

fn default_initial_store() -> String {
    "hq".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            initial_store: default_initial_store(),
            can_edit: false,
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub session: SessionSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.base_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "Server URL must start with http:// or https://, got: {}",
                self.server.base_url
            )));
        }

        if self.server.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.retry.initial_backoff_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "initial_backoff_ms must be greater than 0".into(),
            ));
        }

        self.initial_context()?;
        Ok(())
    }

    /// Applies `STOREFRONT_*` overrides read through `lookup`.
    ///
    /// `load` passes the process environment; tests pass a map.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOREFRONT_BASE_URL") {
            debug!(url = %url, "Overriding server URL from environment");
            self.server.base_url = url;
        }

        if let Some(token) = lookup("STOREFRONT_TOKEN") {
            debug!("Overriding API token from environment");
            self.server.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(timeout) = lookup("STOREFRONT_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.server.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric STOREFRONT_TIMEOUT_SECS"),
            }
        }

        if let Some(store) = lookup("STOREFRONT_STORE") {
            debug!(store = %store, "Overriding initial store from environment");
            self.session.initial_store = store;
        }

        if let Some(can_edit) = lookup("STOREFRONT_CAN_EDIT") {
            match can_edit.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.session.can_edit = true,
                "0" | "false" | "no" => self.session.can_edit = false,
                _ => warn!(value = %can_edit, "Unknown STOREFRONT_CAN_EDIT value"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "pos")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The parsed service root.
    pub fn base_url(&self) -> ClientResult<Url> {
        Ok(Url::parse(self.server.base_url.trim())?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// The store context a new session starts in.
    pub fn initial_context(&self) -> ClientResult<StoreContext> {
        self.session
            .initial_store
            .parse()
            .map_err(|e: storefront_core::ValidationError| ClientError::InvalidConfig(e.to_string()))
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_edit: self.session.can_edit,
        }
    }
}
