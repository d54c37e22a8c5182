//! # POS Session
//!
//! One operator's engine: store context, stock snapshot, cart, selection and
//! checkout, driven against a [`StorefrontBackend`].
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Command Flow                                 │
//! │                                                                         │
//! │  command ──► lock ──► validate + build request ──► unlock              │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                         backend call (await)                           │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │              lock ──► apply outcome (complete / fail / clear) ──► unlock│
//! │                                                                         │
//! │  The state lock is a std Mutex taken only inside `with_state*`          │
//! │  closures, so it is never held across an await.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot generations
//! Every stock load takes a generation number when it starts. A response is
//! installed only if the context is still the one it was loaded for and no
//! newer load has been installed; otherwise it is dropped with
//! `SnapshotSuperseded`.
//!
//! ## In-flight submissions
//! Transfers, stock receipts, bundle/product/store creation and
//! reconciliation hold an `InFlightGuard` for their operation; a second
//! attempt fails with `OperationInFlight`. Order submission uses the
//! checkout machine's `Submitting` state for the same purpose.
//!
//! A finished transfer or bundle deselects only the SKUs it carried, so rows
//! toggled while the call was in flight stay selected.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storefront_core::validation::validate_search_query;
use storefront_core::{
    add_bundle, catalog, context::authorize, Bundle, BundleDraft, BundleResolution, Capabilities,
    Cart, CartTotals, CheckoutMachine, CheckoutState, CoreError, CoreResult, CustomerInfo,
    NewBundle, NewProduct, NewStore, Operation, OrderQuery, OrderReceipt,
    OrderReconciliationSummary, OrderSummary, Product, ReconciliationLogEntry,
    ReconciliationReport, SearchField, SelectionSet, StockReceipt, StockSnapshot, Store,
    StoreContext, StoreId, TransferRequest, TransferRequestBuilder, VerificationView,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::StorefrontBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpBackend;
use crate::retry::{with_read_retry, RetryPolicy};

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug)]
struct SessionState {
    context: StoreContext,
    snapshot: Option<Arc<StockSnapshot>>,
    /// Generation handed to the most recently started stock load.
    requested_generation: u64,
    /// Generation of the snapshot currently installed.
    installed_generation: u64,
    cart: Cart,
    selection: SelectionSet,
    checkout: CheckoutMachine,
    in_flight: HashSet<Operation>,
}

impl SessionState {
    fn new(context: StoreContext) -> Self {
        SessionState {
            context,
            snapshot: None,
            requested_generation: 0,
            installed_generation: 0,
            cart: Cart::new(),
            selection: SelectionSet::new(),
            checkout: CheckoutMachine::new(),
            in_flight: HashSet::new(),
        }
    }

    fn snapshot(&self) -> ClientResult<Arc<StockSnapshot>> {
        self.snapshot
            .clone()
            .ok_or(ClientError::SnapshotNotLoaded(self.context))
    }

    /// Runs a cart edit. A finished checkout returns to `Selecting`, but
    /// only if the edit itself succeeds.
    fn edit_cart<R>(&mut self, f: impl FnOnce(&mut Cart) -> CoreResult<R>) -> ClientResult<R> {
        let mut checkout = self.checkout.clone();
        checkout.ensure_editable()?;
        let result = f(&mut self.cart)?;
        self.checkout = checkout;
        Ok(result)
    }
}

/// Releases an operation's in-flight slot when dropped.
#[derive(Debug)]
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    operation: Operation,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight.remove(&self.operation);
    }
}

// =============================================================================
// PosSession
// =============================================================================

/// A single operator's POS session.
pub struct PosSession {
    id: Uuid,
    backend: Arc<dyn StorefrontBackend>,
    capabilities: Capabilities,
    retry: RetryPolicy,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for PosSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosSession")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("context", &self.context())
            .finish_non_exhaustive()
    }
}

impl PosSession {
    /// Creates a session. No stock is loaded until [`reload_stock`] or
    /// [`switch_context`] is called.
    ///
    /// [`reload_stock`]: PosSession::reload_stock
    /// [`switch_context`]: PosSession::switch_context
    pub fn new(
        backend: Arc<dyn StorefrontBackend>,
        context: StoreContext,
        capabilities: Capabilities,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, %context, can_edit = capabilities.can_edit, "Session created");
        PosSession {
            id,
            backend,
            capabilities,
            retry: RetryPolicy::default(),
            state: Mutex::new(SessionState::new(context)),
        }
    }

    /// Builds an HTTP-backed session from configuration.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let backend = HttpBackend::from_config(config)?;
        Ok(
            Self::new(Arc::new(backend), config.initial_context()?, config.capabilities())
                .with_retry(RetryPolicy::from(&config.retry)),
        )
    }

    /// Replaces the read retry policy.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.lock();
        f(&state)
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.lock();
        f(&mut state)
    }

    fn begin(&self, operation: Operation) -> ClientResult<InFlightGuard<'_>> {
        self.with_state_mut(|state| {
            if state.in_flight.insert(operation) {
                Ok(())
            } else {
                Err(ClientError::OperationInFlight(operation))
            }
        })?;
        Ok(InFlightGuard {
            state: &self.state,
            operation,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn context(&self) -> StoreContext {
        self.with_state(|s| s.context)
    }

    /// The installed snapshot for the active context, if loaded.
    pub fn snapshot(&self) -> Option<Arc<StockSnapshot>> {
        self.with_state(|s| s.snapshot.clone())
    }

    pub fn cart(&self) -> Cart {
        self.with_state(|s| s.cart.clone())
    }

    pub fn totals(&self) -> CartTotals {
        self.with_state(|s| CartTotals::from(&s.cart))
    }

    pub fn selection(&self) -> SelectionSet {
        self.with_state(|s| s.selection.clone())
    }

    pub fn checkout_state(&self) -> CheckoutState {
        self.with_state(|s| s.checkout.state().clone())
    }

    /// Snapshot products matching `query`, sorted by SKU.
    pub fn visible_products(&self, query: &str, field: &SearchField) -> ClientResult<Vec<Product>> {
        let query = validate_search_query(query).map_err(CoreError::from)?;
        let snapshot = self.with_state(SessionState::snapshot)?;
        Ok(catalog::filter_products(snapshot.products(), &query, field)
            .into_iter()
            .cloned()
            .collect())
    }

    // =========================================================================
    // Store Context & Stock
    // =========================================================================

    /// Makes `context` active and loads its stock. Cart and selection are kept.
    pub async fn switch_context(&self, context: StoreContext) -> ClientResult<Arc<StockSnapshot>> {
        self.with_state_mut(|state| {
            if state.context != context {
                info!(session = %self.id, from = %state.context, to = %context, "Switching store context");
                state.context = context;
                state.snapshot = None;
            }
        });
        self.reload_stock().await
    }

    /// Switches to `store`, treating the master store as HQ.
    pub async fn switch_to_store(&self, store: &Store) -> ClientResult<Arc<StockSnapshot>> {
        self.switch_context(StoreContext::from_store(store)).await
    }

    /// Loads a fresh snapshot for the active context and installs it.
    ///
    /// ## Errors
    /// - `SnapshotSuperseded` when the context changed, or a newer load was
    ///   installed, while this one was in flight
    /// - Remote errors after read retries are exhausted
    pub async fn reload_stock(&self) -> ClientResult<Arc<StockSnapshot>> {
        let (context, generation) = self.with_state_mut(|state| {
            state.requested_generation += 1;
            (state.context, state.requested_generation)
        });
        debug!(session = %self.id, %context, generation, "Loading stock");

        let backend = &self.backend;
        let entries =
            with_read_retry(&self.retry, "load_stock", || backend.load_stock(context)).await?;
        let snapshot = Arc::new(StockSnapshot::new(context, entries));

        self.with_state_mut(|state| {
            if state.context != context || generation <= state.installed_generation {
                warn!(
                    session = %self.id,
                    %context,
                    generation,
                    installed = state.installed_generation,
                    "Discarding stale stock snapshot"
                );
                return Err(ClientError::SnapshotSuperseded(context));
            }
            state.installed_generation = generation;
            state.snapshot = Some(Arc::clone(&snapshot));
            debug!(session = %self.id, %context, products = snapshot.len(), "Stock snapshot installed");
            Ok(Arc::clone(&snapshot))
        })
    }

    async fn reload_best_effort(&self) {
        if let Err(e) = self.reload_stock().await {
            warn!(session = %self.id, error = %e, "Stock reload failed");
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds `quantity` of a snapshot product. Returns the line's new quantity.
    pub fn add_product(&self, sku: &str, quantity: u32) -> ClientResult<u32> {
        debug!(session = %self.id, sku, quantity, "add_product");
        self.with_state_mut(|state| {
            let snapshot = state.snapshot()?;
            let product = snapshot
                .product(sku)
                .ok_or_else(|| CoreError::ProductNotFound(sku.to_string()))?;
            state.edit_cart(|cart| cart.add_line(product, quantity, &snapshot))
        })
    }

    /// Explodes `bundle` into the cart.
    ///
    /// Components missing from the snapshot are skipped and reported in the
    /// returned resolution; the call still succeeds.
    pub fn add_bundle(&self, bundle: &Bundle) -> ClientResult<BundleResolution> {
        debug!(session = %self.id, bundle = %bundle.sku, "add_bundle");
        let resolution = self.with_state_mut(|state| {
            let snapshot = state.snapshot()?;
            state.edit_cart(|cart| add_bundle(cart, bundle, &snapshot))
        })?;

        if let Some(warning) = resolution.warning() {
            warn!(session = %self.id, missing = ?warning.missing_skus, "{}", warning);
        }
        Ok(resolution)
    }

    /// Removes one unit of `sku`. Returns what is left on the line.
    pub fn remove_one(&self, sku: &str) -> ClientResult<u32> {
        debug!(session = %self.id, sku, "remove_one");
        self.with_state_mut(|state| state.edit_cart(|cart| cart.remove_one(sku)))
    }

    /// Removes the whole line for `sku`.
    pub fn remove_line(&self, sku: &str) -> ClientResult<()> {
        debug!(session = %self.id, sku, "remove_line");
        self.with_state_mut(|state| state.edit_cart(|cart| cart.remove_line(sku).map(|_| ())))
    }

    pub fn set_customer(&self, name: Option<&str>, phone: Option<&str>) -> ClientResult<()> {
        let customer = CustomerInfo::new(name, phone);
        debug!(session = %self.id, has_name = customer.has_name(), "set_customer");
        self.with_state_mut(|state| {
            state.edit_cart(|cart| {
                cart.set_customer(customer);
                Ok(())
            })
        })
    }

    /// Empties the cart and customer, and returns checkout to `Selecting`.
    pub fn cancel_sale(&self) -> ClientResult<()> {
        info!(session = %self.id, "Cancelling sale");
        self.with_state_mut(|state| {
            state.checkout.reset()?;
            state.cart.clear();
            Ok(())
        })
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Selecting → Verifying.
    pub fn to_verifying(&self) -> ClientResult<VerificationView> {
        self.with_state_mut(|state| {
            let context = state.context;
            let view = state.checkout.to_verifying(&state.cart, context)?;
            debug!(session = %self.id, store = %view.store_id, total = %view.total, "Order verification");
            Ok(view)
        })
    }

    /// Verifying → Selecting.
    pub fn back_to_selecting(&self) -> ClientResult<()> {
        self.with_state_mut(|state| Ok(state.checkout.back()?))
    }

    /// Failed → Selecting.
    pub fn retry_checkout(&self) -> ClientResult<()> {
        self.with_state_mut(|state| Ok(state.checkout.retry()?))
    }

    /// Sends the verified order exactly once.
    ///
    /// ## Outcomes
    /// - Success: checkout `Completed`, cart and customer cleared, stock reloaded
    /// - Failure: checkout `Failed` with the reason, cart untouched; a server
    ///   rejection also reloads stock so quantities can be adjusted
    pub async fn submit_order(&self) -> ClientResult<OrderReceipt> {
        let order = self.with_state_mut(|state| {
            let context = state.context;
            state.checkout.begin_submit(&state.cart, context)
        })?;

        info!(
            session = %self.id,
            store = %order.store_id,
            lines = order.items.len(),
            "Submitting order"
        );

        match self.backend.create_order(&order).await {
            Ok(receipt) => {
                self.with_state_mut(|state| {
                    state.checkout.complete(receipt.clone(), &mut state.cart)
                })?;
                info!(session = %self.id, order_id = receipt.order_id, "Order completed");
                self.reload_best_effort().await;
                Ok(receipt)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Order submission failed");
                self.with_state_mut(|state| state.checkout.fail(e.to_string()))?;
                if matches!(e, ClientError::RemoteRejected { .. }) {
                    self.reload_best_effort().await;
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggles `sku`. Returns whether it is now selected.
    pub fn toggle_selection(&self, sku: &str) -> bool {
        self.with_state_mut(|state| state.selection.toggle(sku))
    }

    /// Selects every product visible under the filter, or clears the
    /// selection if exactly those are already selected.
    pub fn toggle_select_all(&self, query: &str, field: &SearchField) -> ClientResult<SelectionSet> {
        let query = validate_search_query(query).map_err(CoreError::from)?;
        self.with_state_mut(|state| {
            let snapshot = state.snapshot()?;
            let visible = catalog::visible_skus(snapshot.products(), &query, field);
            state.selection.toggle_all(visible);
            Ok(state.selection.clone())
        })
    }

    pub fn clear_selection(&self) {
        self.with_state_mut(|state| state.selection.clear());
    }

    // =========================================================================
    // Stock Movement & Catalog Authoring
    // =========================================================================

    /// Allocates `quantity` of every selected SKU from HQ to `target`.
    pub async fn allocate_selection(
        &self,
        target: StoreId,
        quantity: u32,
    ) -> ClientResult<TransferRequest> {
        let request = self.with_state(|state| {
            TransferRequestBuilder::new(&state.selection, quantity).build_allocate(
                state.context,
                self.capabilities,
                target,
            )
        })?;
        self.submit_transfer(Operation::Allocate, request).await
    }

    /// Returns `quantity` of every selected SKU from the active store to HQ.
    pub async fn return_selection(&self, quantity: u32) -> ClientResult<TransferRequest> {
        let request = self.with_state(|state| {
            TransferRequestBuilder::new(&state.selection, quantity)
                .build_return(state.context, self.capabilities)
        })?;
        self.submit_transfer(Operation::Return, request).await
    }

    async fn submit_transfer(
        &self,
        operation: Operation,
        request: TransferRequest,
    ) -> ClientResult<TransferRequest> {
        let _guard = self.begin(operation)?;
        info!(
            session = %self.id,
            direction = %request.direction,
            store = %request.store_id,
            items = request.items.len(),
            "Submitting stock transfer"
        );

        self.backend.transfer_stock(&request).await?;

        self.with_state_mut(|state| {
            state
                .selection
                .remove_all(request.items.iter().map(|item| item.sku.as_str()))
        });
        self.reload_best_effort().await;
        Ok(request)
    }

    /// Creates a bundle from the selection, `quantity` of each product.
    pub async fn create_bundle_from_selection(
        &self,
        draft: &BundleDraft,
        quantity: u32,
    ) -> ClientResult<NewBundle> {
        let bundle = self.with_state(|state| {
            TransferRequestBuilder::new(&state.selection, quantity).build_bundle(
                state.context,
                self.capabilities,
                draft,
            )
        })?;

        let _guard = self.begin(Operation::CreateBundle)?;
        info!(
            session = %self.id,
            sku = %bundle.sku,
            components = bundle.components.len(),
            "Creating bundle"
        );
        self.backend.create_bundle(&bundle).await?;

        self.with_state_mut(|state| {
            state
                .selection
                .remove_all(bundle.components.iter().map(|c| c.product_sku.as_str()))
        });
        Ok(bundle)
    }

    /// Creates a catalog product. HQ only, needs the edit capability.
    pub async fn create_product(&self, product: &NewProduct) -> ClientResult<Product> {
        let context = self.context();
        authorize(context, self.capabilities, Operation::CreateProduct)?;
        let product = product.normalized();
        product.validate().map_err(CoreError::from)?;

        let _guard = self.begin(Operation::CreateProduct)?;
        info!(session = %self.id, sku = %product.sku, kind = %product.details.kind(), "Creating product");
        let created = self.backend.create_product(&product).await?;

        self.reload_best_effort().await;
        Ok(created)
    }

    /// Books goods received at HQ, then reloads stock.
    pub async fn receive_stock(&self, sku: &str, quantity: u32) -> ClientResult<StockReceipt> {
        authorize(self.context(), self.capabilities, Operation::ReceiveStock)?;
        let receipt = StockReceipt::new(sku, quantity);
        receipt.validate().map_err(CoreError::from)?;

        let _guard = self.begin(Operation::ReceiveStock)?;
        info!(session = %self.id, sku = %receipt.sku, quantity, "Receiving stock at HQ");
        self.backend.receive_stock(&receipt).await?;

        self.reload_best_effort().await;
        Ok(receipt)
    }

    /// Opens a new virtual store. HQ only, needs the edit capability.
    pub async fn create_store(&self, name: &str) -> ClientResult<Store> {
        authorize(self.context(), self.capabilities, Operation::CreateStore)?;
        let store = NewStore::new(name);
        store.validate().map_err(CoreError::from)?;

        let _guard = self.begin(Operation::CreateStore)?;
        info!(session = %self.id, name = %store.name, "Creating store");
        let created = self.backend.create_store(&store).await?;
        info!(session = %self.id, store = %created.id, "Store created");
        Ok(created)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Reconciles the active store. The report is the server's, unchanged.
    pub async fn reconcile(&self, return_stock: bool) -> ClientResult<ReconciliationReport> {
        let context = self.context();
        authorize(context, self.capabilities, Operation::Reconcile)?;
        let store = context.store_id().ok_or(CoreError::InvalidContextOperation {
            operation: Operation::Reconcile,
            context,
        })?;

        let _guard = self.begin(Operation::Reconcile)?;
        info!(session = %self.id, %store, return_stock, "Reconciling store");
        let report = self.backend.reconcile_store(store, return_stock).await?;

        if return_stock {
            self.reload_best_effort().await;
        }
        Ok(report)
    }

    // =========================================================================
    // Reads (retried)
    // =========================================================================

    pub async fn list_stores(&self) -> ClientResult<Vec<Store>> {
        let backend = &self.backend;
        with_read_retry(&self.retry, "list_stores", || backend.list_stores()).await
    }

    pub async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let backend = &self.backend;
        with_read_retry(&self.retry, "list_products", || backend.list_products()).await
    }

    pub async fn list_bundles(&self) -> ClientResult<Vec<Bundle>> {
        let backend = &self.backend;
        with_read_retry(&self.retry, "list_bundles", || backend.list_bundles()).await
    }

    /// Past orders matching the customer filters, newest first.
    pub async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<OrderSummary>> {
        let backend = &self.backend;
        with_read_retry(&self.retry, "list_orders", || backend.list_orders(query)).await
    }

    pub async fn reconciliation_history(
        &self,
        store: StoreId,
    ) -> ClientResult<Vec<ReconciliationLogEntry>> {
        let backend = &self.backend;
        with_read_retry(&self.retry, "reconciliation_history", || {
            backend.reconciliation_history(store)
        })
        .await
    }

    pub async fn order_reconciliation_summary(
        &self,
        store: Option<StoreId>,
    ) -> ClientResult<OrderReconciliationSummary> {
        let backend = &self.backend;
        with_read_retry(&self.retry, "order_reconciliation_summary", || {
            backend.order_reconciliation_summary(store)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_cart_keeps_checkout_on_failure() {
        let mut state = SessionState::new(StoreContext::Store(StoreId(1)));
        let result: ClientResult<()> =
            state.edit_cart(|_| Err(CoreError::LineNotFound("SKU-X".into())));
        assert!(matches!(result, Err(ClientError::Core(CoreError::LineNotFound(_)))));
        assert_eq!(state.checkout.phase(), storefront_core::CheckoutPhase::Selecting);
    }

    #[test]
    fn test_missing_snapshot_is_reported_for_context() {
        let state = SessionState::new(StoreContext::Hq);
        assert!(matches!(
            state.snapshot(),
            Err(ClientError::SnapshotNotLoaded(StoreContext::Hq))
        ));
    }
}
