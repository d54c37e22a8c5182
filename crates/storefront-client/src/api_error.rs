//! # API Error Type
//!
//! Serializable error for UI shells (web, Android, desktop) driving a
//! [`PosSession`](crate::PosSession).
//!
//! ```json
//! {
//!   "code": "STOCK_EXCEEDED",
//!   "message": "Insufficient stock for SKU-A: requested 2, remaining 1"
//! }
//! ```

use serde::Serialize;
use storefront_core::{CheckoutError, CoreError};

use crate::error::ClientError;

/// Error returned to UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or cart line not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Adding would pass the snapshot's availability
    StockExceeded,

    /// Cart limits (lines, quantity per line)
    CartError,

    /// Transfer or bundle requested with nothing selected
    EmptySelection,

    /// Operation not available in the active store context
    InvalidContext,

    /// Operator lacks the edit capability
    Forbidden,

    /// Checkout precondition or transition failure
    CheckoutError,

    /// Same submission already running
    InFlight,

    /// Stock not loaded yet, or a load was superseded
    StockUnavailable,

    /// Server declined the request
    RemoteRejected,

    /// No definitive answer from the server
    NetworkError,

    /// Client configuration problem
    ConfigError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::StockExceeded { .. } => ErrorCode::StockExceeded,
            CoreError::ProductNotFound(_) | CoreError::LineNotFound(_) => ErrorCode::NotFound,
            CoreError::EmptySelection => ErrorCode::EmptySelection,
            CoreError::InvalidContextOperation { .. } => ErrorCode::InvalidContext,
            CoreError::NotPermitted { .. } => ErrorCode::Forbidden,
            CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        let code = match &err {
            CheckoutError::SubmissionInFlight => ErrorCode::InFlight,
            _ => ErrorCode::CheckoutError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(e) => e.into(),
            ClientError::Checkout(e) => e.into(),
            ClientError::OperationInFlight(_) => ApiError::new(ErrorCode::InFlight, err.to_string()),
            ClientError::SnapshotNotLoaded(_) | ClientError::SnapshotSuperseded(_) => {
                ApiError::new(ErrorCode::StockUnavailable, err.to_string())
            }
            ClientError::RemoteRejected { .. } => {
                ApiError::new(ErrorCode::RemoteRejected, err.to_string())
            }
            ClientError::NetworkFailure(_) => ApiError::new(ErrorCode::NetworkError, err.to_string()),
            ClientError::DeserializationFailed(ref detail) => {
                tracing::error!("Unreadable server response: {}", detail);
                ApiError::internal("The server sent an unexpected response")
            }
            ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_) => {
                ApiError::new(ErrorCode::ConfigError, err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
