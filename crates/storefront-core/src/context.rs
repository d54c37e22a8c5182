//! # Store Context
//!
//! Which stock pool the operator is working against, and which operations
//! that allows.
//!
//! ## Context Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   StoreContext::Hq                 StoreContext::Store(id)              │
//! │   ────────────────                 ───────────────────────              │
//! │   allocate        ✅               return           ✅                  │
//! │   create bundle   ✅ (can_edit)    reconcile        ✅                  │
//! │   create product  ✅ (can_edit)    checkout         ✅                  │
//! │   receive stock   ✅ (can_edit)                                         │
//! │   create store    ✅ (can_edit)                                         │
//! │                                                                         │
//! │   Anything else → CoreError::InvalidContextOperation                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UI disables buttons too, but the engine checks again on every call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Store, StoreId, StoreKind};

// =============================================================================
// Store Context
// =============================================================================

/// The active store, or the HQ pseudo-store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "storeId", rename_all = "lowercase")]
#[ts(export)]
pub enum StoreContext {
    Hq,
    Store(StoreId),
}

impl StoreContext {
    pub fn is_hq(&self) -> bool {
        matches!(self, StoreContext::Hq)
    }

    /// The concrete store id, if any.
    pub fn store_id(&self) -> Option<StoreId> {
        match self {
            StoreContext::Hq => None,
            StoreContext::Store(id) => Some(*id),
        }
    }

    /// Maps a store record to a context; the master store is HQ.
    pub fn from_store(store: &Store) -> Self {
        match store.kind {
            StoreKind::Master => StoreContext::Hq,
            _ => StoreContext::Store(store.id),
        }
    }

    /// Whether `operation` may be issued from this context.
    pub fn allows(&self, operation: Operation) -> bool {
        match operation {
            Operation::Allocate
            | Operation::CreateBundle
            | Operation::CreateProduct
            | Operation::ReceiveStock
            | Operation::CreateStore => self.is_hq(),
            Operation::Return | Operation::Reconcile | Operation::Checkout => !self.is_hq(),
        }
    }

    /// Fails with `InvalidContextOperation` when `operation` is not allowed.
    pub fn require(&self, operation: Operation) -> CoreResult<()> {
        if self.allows(operation) {
            Ok(())
        } else {
            Err(CoreError::InvalidContextOperation {
                operation,
                context: *self,
            })
        }
    }
}

impl Default for StoreContext {
    fn default() -> Self {
        StoreContext::Hq
    }
}

impl fmt::Display for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreContext::Hq => f.write_str("HQ"),
            StoreContext::Store(id) => write!(f, "store {}", id),
        }
    }
}

/// Parses `hq` / `master` (any case) or a numeric store id.
impl FromStr for StoreContext {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("hq") || s.eq_ignore_ascii_case("master") {
            return Ok(StoreContext::Hq);
        }
        s.parse::<i64>()
            .map(|id| StoreContext::Store(StoreId(id)))
            .map_err(|_| ValidationError::InvalidFormat {
                field: "store".to_string(),
                reason: format!("expected 'hq' or a store id, got '{}'", s),
            })
    }
}

// =============================================================================
// Operations & Capabilities
// =============================================================================

/// Context-sensitive operations the engine can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Operation {
    Allocate,
    Return,
    CreateBundle,
    CreateProduct,
    ReceiveStock,
    CreateStore,
    Reconcile,
    Checkout,
}

impl Operation {
    /// Catalog and store authoring need the edit capability on top of HQ
    /// context.
    pub fn requires_edit(&self) -> bool {
        matches!(
            self,
            Operation::CreateBundle
                | Operation::CreateProduct
                | Operation::ReceiveStock
                | Operation::CreateStore
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operation::Allocate => "allocate",
            Operation::Return => "return",
            Operation::CreateBundle => "create bundle",
            Operation::CreateProduct => "create product",
            Operation::ReceiveStock => "receive stock",
            Operation::CreateStore => "create store",
            Operation::Reconcile => "reconcile",
            Operation::Checkout => "checkout",
        };
        f.write_str(text)
    }
}

/// What the signed-in operator may do, fixed at session construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Capabilities {
    pub can_edit: bool,
}

impl Capabilities {
    pub const fn editor() -> Self {
        Capabilities { can_edit: true }
    }

    pub const fn read_only() -> Self {
        Capabilities { can_edit: false }
    }
}

/// Checks both the context rule and the capability for `operation`.
///
/// The context rule is checked first, so a read-only operator on the wrong
/// context sees the context error.
pub fn authorize(
    context: StoreContext,
    capabilities: Capabilities,
    operation: Operation,
) -> CoreResult<()> {
    context.require(operation)?;
    if operation.requires_edit() && !capabilities.can_edit {
        return Err(CoreError::NotPermitted { operation });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
