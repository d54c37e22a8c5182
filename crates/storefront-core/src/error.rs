//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Local rule violations (stock, context, ...)    │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CheckoutError    - Checkout transition failures                   │
//! │                                                                         │
//! │  storefront-client errors (separate crate)                             │
//! │  └── ClientError      - Remote rejections, network, config             │
//! │                                                                         │
//! │  UI boundary                                                           │
//! │  └── ApiError         - What shells see (serialized)                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → ApiError → UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, store, operation)
//! 3. Errors are enum variants, never String
//! 4. Every error here is raised BEFORE any state change: a caller that
//!    gets an `Err` can assume the cart/selection is exactly as it was

use std::fmt;

use thiserror::Error;

use crate::checkout::CheckoutPhase;
use crate::context::{Operation, StoreContext};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are local, pre-network failures. They should be caught and
/// translated to user-friendly messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Adding the requested quantity would exceed the stock ceiling.
    ///
    /// ## User Workflow
    /// ```text
    /// Snapshot: SKU-A available=3, cart has 2
    ///      │
    ///      ▼
    /// add_line(SKU-A, 2)
    ///      │
    ///      ▼
    /// StockExceeded { sku: "SKU-A", requested: 2, remaining: 1 }
    ///      │
    ///      ▼
    /// UI shows: "Only 1 more SKU-A available"
    /// ```
    #[error("Insufficient stock for {sku}: requested {requested}, remaining {remaining}")]
    StockExceeded {
        sku: String,
        requested: u32,
        remaining: u32,
    },

    /// Product is not present in the active stock snapshot.
    #[error("Product not found in current stock: {0}")]
    ProductNotFound(String),

    /// Cart has no line for the given SKU.
    #[error("Cart has no line for {0}")]
    LineNotFound(String),

    /// A transfer or bundle was requested with nothing selected.
    #[error("No products selected")]
    EmptySelection,

    /// The operation is not valid from the active store context.
    ///
    /// ## When This Occurs
    /// - Allocating while a store (not HQ) is active
    /// - Returning or checking out while HQ is active
    #[error("{operation} is not available while {context} is active")]
    InvalidContextOperation {
        operation: Operation,
        context: StoreContext,
    },

    /// The session's capabilities do not allow the operation.
    #[error("{operation} requires edit permission")]
    NotPermitted { operation: Operation },

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity would exceed the per-line maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed SKU, unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same component twice in a bundle).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Checkout Error
// =============================================================================

/// A checkout precondition that did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutPrecondition {
    EmptyCart,
    MissingCustomerName,
    NoStoreSelected,
}

impl fmt::Display for CheckoutPrecondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CheckoutPrecondition::EmptyCart => "cart is empty",
            CheckoutPrecondition::MissingCustomerName => "customer name is required",
            CheckoutPrecondition::NoStoreSelected => "select a store to sell from",
        };
        f.write_str(text)
    }
}

/// Checkout state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// One or more preconditions failed. All of them are listed.
    #[error("Cannot verify order: {}", join_preconditions(.0))]
    PreconditionsFailed(Vec<CheckoutPrecondition>),

    /// The action is not valid in the current phase.
    #[error("Cannot {action} while checkout is {from}")]
    InvalidTransition {
        from: CheckoutPhase,
        action: &'static str,
    },

    /// An order submission is already running.
    #[error("An order submission is already in progress")]
    SubmissionInFlight,
}

fn join_preconditions(items: &[CheckoutPrecondition]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
