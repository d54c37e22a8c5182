//! # storefront-core: Cart & Stock-Movement Composition Engine
//!
//! This crate holds every piece of client-side logic that computes state
//! rather than just displaying it. It has zero I/O dependencies: the remote
//! storefront service owns stock balances, orders and ledgers, and the
//! `storefront-client` crate performs the round trips.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                UI shells (web, Android, desktop)                │   │
//! │  │   Catalog table ──► Cart panel ──► Verify ──► Confirm sale     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         storefront-client (PosSession, HTTP backend)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   snapshot ─► cart ◄─ bundle      selection ─► transfer        │   │
//! │  │                 │                      ▲                        │   │
//! │  │                 ▼                      │                        │   │
//! │  │             checkout ◄──── context ────┘                        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO GLOBAL STATE                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money (cents) plus the decimal wire adapter
//! - [`types`] - Products, bundles, stores, request payloads
//! - [`snapshot`] - Per-context stock snapshot (the stock ceiling)
//! - [`cart`] - Line aggregator
//! - [`bundle`] - Bundle resolver (explosion policy)
//! - [`selection`] - Selection set manager
//! - [`context`] - Store context, operations and capabilities
//! - [`transfer`] - Allocate / return / bundle-from-selection builders
//! - [`checkout`] - Checkout state machine
//! - [`catalog`] - Catalog search filter
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::{Cart, Money, Product, StockEntry, StockSnapshot, StoreContext, StoreId};
//!
//! let pen = Product::generic("SKU-PEN", "Gel Pen", Money::from_cents(250));
//! let snapshot = StockSnapshot::new(
//!     StoreContext::Store(StoreId(7)),
//!     vec![StockEntry::new(pen.clone(), 3)],
//! );
//!
//! let mut cart = Cart::new();
//! cart.add_line(&pen, 2, &snapshot).unwrap();
//!
//! // A third and fourth pen would exceed the 3 in stock
//! assert!(cart.add_line(&pen, 2, &snapshot).is_err());
//! assert_eq!(cart.total().cents(), 500);
//! ```

pub mod bundle;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod context;
pub mod error;
pub mod money;
pub mod selection;
pub mod snapshot;
pub mod transfer;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bundle::{add_bundle, BundleResolution, PartialBundleResolution};
pub use cart::{Cart, CartLine, CartTotals};
pub use catalog::SearchField;
pub use checkout::{CheckoutMachine, CheckoutPhase, CheckoutState, VerificationView};
pub use context::{Capabilities, Operation, StoreContext};
pub use error::{CheckoutError, CheckoutPrecondition, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use selection::SelectionSet;
pub use snapshot::{StockEntry, StockSnapshot};
pub use transfer::TransferRequestBuilder;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Keeps a sale reviewable on the verification screen.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line (and of a single transfer item).
///
/// ## Business Reason
/// Catches fat-finger entries (1000 instead of 10) before they reach the
/// ceiling check or the server.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Highest unit price accepted from the catalog, in cents ($100,000,000).
///
/// ## Business Reason
/// A cart of MAX_CART_LINES lines at MAX_LINE_QUANTITY each stays well
/// inside `i64`, so totals never need to saturate.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;
