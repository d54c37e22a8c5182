//! # Client Error Types
//!
//! Error types for session and backend operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Local        │  │     Remote              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Core           │  │  RemoteRejected         │ │
//! │  │  InvalidUrl     │  │  Checkout       │  │  NetworkFailure         │ │
//! │  │  ConfigLoad/Save│  │  OperationIn... │  │  DeserializationFailed  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Local errors are raised before any request is sent and never leave    │
//! │  the session half-changed. Remote errors never change local state,     │
//! │  except that a rejected order moves checkout to Failed.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use storefront_core::{CheckoutError, CoreError, Operation, StoreContext};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering all possible session failures.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid server URL.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// A cart, selection or context rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A checkout transition was not allowed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// No stock snapshot has been loaded for the active context yet.
    #[error("Stock for {0} has not been loaded yet")]
    SnapshotNotLoaded(StoreContext),

    /// A stock load finished after the context moved on; its result was dropped.
    #[error("Stock for {0} arrived after the store changed and was discarded")]
    SnapshotSuperseded(StoreContext),

    /// The same kind of submission is already running.
    #[error("A {0} request is already in progress")]
    OperationInFlight(Operation),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The server declined the request. `message` is the server's text.
    #[error("{message}")]
    RemoteRejected { status: u16, message: String },

    /// No definitive answer from the server.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The server answered with a body we could not read.
    #[error("Unexpected response: {0}")]
    DeserializationFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::DeserializationFailed(err.to_string())
        } else {
            ClientError::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::DeserializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ClientError {
    /// Returns true if a read can be retried.
    ///
    /// ## Retryable Errors
    /// - Network failures (no answer at all)
    /// - Gateway errors (502, 503, 504)
    ///
    /// Submissions are never retried, whatever this returns.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::NetworkFailure(_) => true,
            ClientError::RemoteRejected { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns true if the error came from the server or the network.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::RemoteRejected { .. }
                | ClientError::NetworkFailure(_)
                | ClientError::DeserializationFailed(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
