//! # storefront: Session Engine for Storefront POS
//!
//! Drives the pure composition logic in `storefront-core` against the
//! remote storefront service.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Architecture                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    PosSession (one per operator)                 │  │
//! │  │                                                                  │  │
//! │  │  context ─► snapshot (Arc) ─► cart / bundles ─► checkout         │  │
//! │  │                     └──────► selection ─► transfers, bundles     │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ dyn StorefrontBackend                   │
//! │         ┌─────────────────────┴─────────────────────┐                  │
//! │         ▼                                           ▼                   │
//! │  ┌────────────────┐                        ┌────────────────────────┐  │
//! │  │  HttpBackend   │                        │  in-memory fakes       │  │
//! │  │  reqwest, JSON │                        │  (tests)               │  │
//! │  │  read retries  │                        │                        │  │
//! │  └────────────────┘                        └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - `PosSession`: context, stock, cart, selection, checkout
//! - [`backend`] - The `StorefrontBackend` trait
//! - [`http`] - REST implementation of the backend
//! - [`wire`] - JSON DTOs of the storefront service
//! - [`retry`] - Backoff for idempotent reads
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Client error types
//! - [`api_error`] - Serializable error for UI shells
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//! ```rust,ignore
//! use storefront::{ClientConfig, PosSession};
//!
//! let config = ClientConfig::load(None)?;
//! let session = PosSession::from_config(&config)?;
//! session.reload_stock().await?;
//! session.add_product("SKU-A", 2)?;
//! session.set_customer(Some("Jane"), None)?;
//! session.to_verifying()?;
//! let receipt = session.submit_order().await?;
//! ```

pub mod api_error;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod session;
pub mod telemetry;
pub mod wire;

pub use api_error::{ApiError, ErrorCode};
pub use backend::StorefrontBackend;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use retry::RetryPolicy;
pub use session::PosSession;
