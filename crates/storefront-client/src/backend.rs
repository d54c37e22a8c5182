//! # Storefront Backend
//!
//! The one seam between the session engine and the remote service.
//!
//! ```text
//! ┌───────────────┐        ┌────────────────────────────┐
//! │  PosSession   │──────► │  dyn StorefrontBackend     │
//! └───────────────┘        │                            │
//!                          │  HttpBackend  (reqwest)    │
//!                          │  test fakes   (in-memory)  │
//!                          └────────────────────────────┘
//! ```
//!
//! Implementations map every server refusal to
//! `ClientError::RemoteRejected` with the server's message untouched, and
//! every transport problem to `ClientError::NetworkFailure`.

use async_trait::async_trait;
use storefront_core::{
    Bundle, NewBundle, NewProduct, NewStore, OrderQuery, OrderReceipt,
    OrderReconciliationSummary, OrderRequest, OrderSummary, Product, ReconciliationLogEntry,
    ReconciliationReport, StockEntry, StockReceipt, Store, StoreContext, StoreId,
    TransferRequest,
};

use crate::error::ClientResult;

/// Remote operations the engine consumes.
#[async_trait]
pub trait StorefrontBackend: Send + Sync {
    // -------------------------------------------------------------------------
    // Catalog reads
    // -------------------------------------------------------------------------

    async fn list_stores(&self) -> ClientResult<Vec<Store>>;

    async fn list_products(&self) -> ClientResult<Vec<Product>>;

    async fn list_bundles(&self) -> ClientResult<Vec<Bundle>>;

    /// Inventory rows for HQ or one store.
    async fn load_stock(&self, context: StoreContext) -> ClientResult<Vec<StockEntry>>;

    /// Past orders matching `query`, newest first. The service scopes the
    /// result to the stores the operator may see.
    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<OrderSummary>>;

    // -------------------------------------------------------------------------
    // Submissions
    // -------------------------------------------------------------------------

    async fn create_order(&self, order: &OrderRequest) -> ClientResult<OrderReceipt>;

    /// Allocate or return, by `request.direction`.
    async fn transfer_stock(&self, request: &TransferRequest) -> ClientResult<()>;

    async fn create_bundle(&self, bundle: &NewBundle) -> ClientResult<()>;

    async fn create_product(&self, product: &NewProduct) -> ClientResult<Product>;

    /// Adds received goods to the HQ pool.
    async fn receive_stock(&self, receipt: &StockReceipt) -> ClientResult<()>;

    async fn create_store(&self, store: &NewStore) -> ClientResult<Store>;

    // -------------------------------------------------------------------------
    // Reconciliation (computed by the service)
    // -------------------------------------------------------------------------

    async fn reconcile_store(
        &self,
        store: StoreId,
        return_stock: bool,
    ) -> ClientResult<ReconciliationReport>;

    async fn reconciliation_history(
        &self,
        store: StoreId,
    ) -> ClientResult<Vec<ReconciliationLogEntry>>;

    /// Summary for one store, or across all stores when `None`.
    async fn order_reconciliation_summary(
        &self,
        store: Option<StoreId>,
    ) -> ClientResult<OrderReconciliationSummary>;
}
