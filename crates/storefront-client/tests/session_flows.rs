//! Session flows against an in-memory backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storefront::{ClientError, ClientResult, PosSession, RetryPolicy, StorefrontBackend};
use storefront_core::{
    Bundle, BundleComponent, BundleDraft, Capabilities, CheckoutError, CheckoutPhase,
    CheckoutPrecondition, CheckoutState, CoreError, CustomerInfo, Money, NewBundle, NewProduct,
    NewStore, Operation, OrderQuery, OrderReceipt, OrderReconciliationSummary, OrderRequest,
    OrderStatus, OrderSummary, Product, ProductDetails, ReconciliationLogEntry,
    ReconciliationReport, SearchField, StockEntry, StockReceipt, Store, StoreContext, StoreId,
    StoreKind, TransferDirection, TransferRequest, ValidationError,
};
use tokio::sync::Notify;

const STORE: StoreContext = StoreContext::Store(StoreId(2));

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct Recorded {
    orders: Vec<OrderRequest>,
    transfers: Vec<TransferRequest>,
    bundles: Vec<NewBundle>,
    receipts: Vec<StockReceipt>,
    stores: Vec<NewStore>,
    order_queries: Vec<OrderQuery>,
    stock_loads: u32,
}

#[derive(Default)]
struct FakeBackend {
    stock: Mutex<HashMap<StoreContext, Vec<StockEntry>>>,
    recorded: Mutex<Recorded>,
    reject_orders_with: Option<String>,
    /// Orders fail as if the service were unreachable.
    orders_offline: bool,
    /// Holds order and transfer submissions until notified.
    submit_gate: Option<Arc<Notify>>,
    /// Holds stock loads for one context until notified.
    stock_gate: Option<(StoreContext, Arc<Notify>)>,
}

impl FakeBackend {
    fn with_stock(context: StoreContext, rows: &[(&str, i64, u32)]) -> Self {
        let backend = FakeBackend::default();
        backend.set_stock(context, rows);
        backend
    }

    fn set_stock(&self, context: StoreContext, rows: &[(&str, i64, u32)]) {
        let entries = rows
            .iter()
            .map(|(sku, cents, available)| {
                StockEntry::new(
                    Product::generic(*sku, format!("Product {}", sku), Money::from_cents(*cents)),
                    *available,
                )
            })
            .collect();
        self.stock.lock().unwrap().insert(context, entries);
    }

    fn recorded<R>(&self, f: impl FnOnce(&Recorded) -> R) -> R {
        f(&self.recorded.lock().unwrap())
    }
}

#[async_trait]
impl StorefrontBackend for FakeBackend {
    async fn list_stores(&self) -> ClientResult<Vec<Store>> {
        Ok(Vec::new())
    }

    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        Ok(Vec::new())
    }

    async fn list_bundles(&self) -> ClientResult<Vec<Bundle>> {
        Ok(Vec::new())
    }

    async fn load_stock(&self, context: StoreContext) -> ClientResult<Vec<StockEntry>> {
        if let Some((gated, gate)) = &self.stock_gate {
            if *gated == context {
                gate.notified().await;
            }
        }
        self.recorded.lock().unwrap().stock_loads += 1;
        Ok(self
            .stock
            .lock()
            .unwrap()
            .get(&context)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<OrderSummary>> {
        self.recorded.lock().unwrap().order_queries.push(query.clone());
        let wanted = query.customer_name.as_deref().map(str::to_lowercase);
        Ok(sample_orders()
            .into_iter()
            .filter(|order| match (&wanted, &order.customer.name) {
                (Some(wanted), Some(name)) => name.to_lowercase().contains(wanted),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect())
    }

    async fn create_order(&self, order: &OrderRequest) -> ClientResult<OrderReceipt> {
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        if self.orders_offline {
            return Err(ClientError::NetworkFailure("connection refused".into()));
        }
        if let Some(message) = &self.reject_orders_with {
            return Err(ClientError::RemoteRejected {
                status: 400,
                message: message.clone(),
            });
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.orders.push(order.clone());
        Ok(OrderReceipt {
            order_id: recorded.orders.len() as i64,
            total: None,
        })
    }

    async fn transfer_stock(&self, request: &TransferRequest) -> ClientResult<()> {
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        self.recorded.lock().unwrap().transfers.push(request.clone());
        Ok(())
    }

    async fn create_bundle(&self, bundle: &NewBundle) -> ClientResult<()> {
        self.recorded.lock().unwrap().bundles.push(bundle.clone());
        Ok(())
    }

    async fn create_product(&self, product: &NewProduct) -> ClientResult<Product> {
        Ok(Product {
            id: Some(99),
            sku: product.sku.clone(),
            name: product.name.clone(),
            price: product.price,
            details: product.details.clone(),
        })
    }

    async fn receive_stock(&self, receipt: &StockReceipt) -> ClientResult<()> {
        if let Some(rows) = self.stock.lock().unwrap().get_mut(&StoreContext::Hq) {
            if let Some(entry) = rows.iter_mut().find(|e| e.product.sku == receipt.sku) {
                entry.available += receipt.quantity;
            }
        }
        self.recorded.lock().unwrap().receipts.push(receipt.clone());
        Ok(())
    }

    async fn create_store(&self, store: &NewStore) -> ClientResult<Store> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.stores.push(store.clone());
        Ok(Store {
            id: StoreId(10 + recorded.stores.len() as i64),
            name: store.name.clone(),
            kind: StoreKind::Virtual,
            location: None,
        })
    }

    async fn reconcile_store(
        &self,
        store: StoreId,
        _return_stock: bool,
    ) -> ClientResult<ReconciliationReport> {
        Ok(sample_report(store))
    }

    async fn reconciliation_history(
        &self,
        _store: StoreId,
    ) -> ClientResult<Vec<ReconciliationLogEntry>> {
        Ok(Vec::new())
    }

    async fn order_reconciliation_summary(
        &self,
        _store: Option<StoreId>,
    ) -> ClientResult<OrderReconciliationSummary> {
        Ok(OrderReconciliationSummary {
            total_orders: 0,
            reconciled_orders: 0,
            unreconciled_orders: 0,
            total_amount: Money::zero(),
            reconciled_amount: Money::zero(),
            unreconciled_amount: Money::zero(),
        })
    }
}

fn sample_report(store: StoreId) -> ReconciliationReport {
    ReconciliationReport {
        store_id: store,
        store_name: "Campus Pop-up".into(),
        total_revenue: Money::from_cents(12_500),
        total_items_sold: 5,
        sold_items: Vec::new(),
        returned_items: Vec::new(),
        assigned_admins: vec!["admin".into()],
    }
}

fn sample_orders() -> Vec<OrderSummary> {
    vec![
        OrderSummary {
            id: 8,
            store_id: Some(StoreId(2)),
            store_name: Some("Campus Pop-up".into()),
            customer: CustomerInfo::new(Some("Jane Doe"), Some("0300-1234567")),
            total: Money::from_cents(1000),
            status: OrderStatus::Completed,
            created_at: None,
            lines: Vec::new(),
        },
        OrderSummary {
            id: 7,
            store_id: Some(StoreId(2)),
            store_name: Some("Campus Pop-up".into()),
            customer: CustomerInfo::default(),
            total: Money::from_cents(250),
            status: OrderStatus::Completed,
            created_at: None,
            lines: Vec::new(),
        },
    ]
}

fn session(backend: &Arc<FakeBackend>, context: StoreContext, caps: Capabilities) -> PosSession {
    PosSession::new(backend.clone(), context, caps).with_retry(RetryPolicy::none())
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_example_sale_scenario() {
    let backend = Arc::new(FakeBackend::with_stock(STORE, &[("SKU-A", 1000, 3)]));
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    assert_eq!(session.add_product("SKU-A", 2).unwrap(), 2);

    let err = session.add_product("SKU-A", 2).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Core(CoreError::StockExceeded { remaining: 1, .. })
    ));
    assert_eq!(session.cart().quantity_of("SKU-A"), 2);

    assert_eq!(session.remove_one("SKU-A").unwrap(), 1);

    session.set_customer(Some("   "), None).unwrap();
    let err = session.to_verifying().unwrap_err();
    match err {
        ClientError::Checkout(CheckoutError::PreconditionsFailed(failed)) => {
            assert_eq!(failed, vec![CheckoutPrecondition::MissingCustomerName]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.checkout_state(), CheckoutState::Selecting);

    session.set_customer(Some("Jane"), None).unwrap();
    let view = session.to_verifying().unwrap();
    assert_eq!(view.store_id, StoreId(2));
    assert_eq!(view.total, Money::from_cents(1000));

    let receipt = session.submit_order().await.unwrap();
    assert_eq!(receipt.order_id, 1);
    assert_eq!(session.checkout_state().phase(), CheckoutPhase::Completed);
    assert!(session.cart().is_empty());
    assert!(!session.cart().customer().has_name());

    let order = backend.recorded(|r| r.orders[0].clone());
    assert_eq!(order.store_id, StoreId(2));
    assert_eq!(order.customer_name.as_deref(), Some("Jane"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].sku, "SKU-A");
    assert_eq!(order.items[0].quantity, 1);
}

#[tokio::test]
async fn test_rejected_order_keeps_cart_and_reloads_stock() {
    let backend = Arc::new(FakeBackend {
        reject_orders_with: Some("Insufficient stock for SKU-A. Available: 0".into()),
        ..FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)])
    });
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    session.add_product("SKU-A", 3).unwrap();
    session.set_customer(Some("Jane"), Some("0300-1234567")).unwrap();
    session.to_verifying().unwrap();
    let before = session.cart();
    let loads_before = backend.recorded(|r| r.stock_loads);

    let err = session.submit_order().await.unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock for SKU-A. Available: 0");
    assert_eq!(
        session.checkout_state(),
        CheckoutState::Failed {
            reason: "Insufficient stock for SKU-A. Available: 0".into()
        }
    );
    assert_eq!(session.cart(), before);
    assert_eq!(backend.recorded(|r| r.stock_loads), loads_before + 1);

    session.retry_checkout().unwrap();
    assert_eq!(session.checkout_state(), CheckoutState::Selecting);
    assert_eq!(session.cart().quantity_of("SKU-A"), 3);
}

#[tokio::test]
async fn test_offline_order_fails_without_touching_cart_or_stock() {
    let backend = Arc::new(FakeBackend {
        orders_offline: true,
        ..FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)])
    });
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    session.add_product("SKU-A", 2).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();
    session.to_verifying().unwrap();
    let before = session.cart();
    let loads_before = backend.recorded(|r| r.stock_loads);

    let err = session.submit_order().await.unwrap_err();
    assert!(matches!(err, ClientError::NetworkFailure(_)));
    assert!(err.is_retryable());
    assert_eq!(session.checkout_state().phase(), CheckoutPhase::Failed);
    assert_eq!(session.cart(), before);
    // Only a server rejection triggers a reload
    assert_eq!(backend.recorded(|r| r.stock_loads), loads_before);
    assert_eq!(backend.recorded(|r| r.orders.len()), 0);
}

#[tokio::test]
async fn test_cancel_sale_empties_cart_from_any_settled_phase() {
    let backend = Arc::new(FakeBackend {
        orders_offline: true,
        ..FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)])
    });
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    // Mid-selection
    session.add_product("SKU-A", 1).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();
    session.cancel_sale().unwrap();
    assert!(session.cart().is_empty());
    assert!(!session.cart().customer().has_name());
    assert_eq!(session.checkout_state(), CheckoutState::Selecting);

    // After a failed submission
    session.add_product("SKU-A", 2).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();
    session.to_verifying().unwrap();
    session.submit_order().await.unwrap_err();
    assert_eq!(session.checkout_state().phase(), CheckoutPhase::Failed);

    session.cancel_sale().unwrap();
    assert!(session.cart().is_empty());
    assert_eq!(session.checkout_state(), CheckoutState::Selecting);
    assert_eq!(session.add_product("SKU-A", 1).unwrap(), 1);
}

#[tokio::test]
async fn test_cancel_sale_refused_while_submitting() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        submit_gate: Some(gate.clone()),
        ..FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)])
    });
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    session.add_product("SKU-A", 1).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();
    session.to_verifying().unwrap();

    let (submitted, cancelled) = tokio::join!(session.submit_order(), async {
        let cancelled = session.cancel_sale();
        gate.notify_one();
        cancelled
    });

    assert!(submitted.is_ok());
    assert!(matches!(
        cancelled,
        Err(ClientError::Checkout(CheckoutError::SubmissionInFlight))
    ));
    assert_eq!(backend.recorded(|r| r.orders[0].items[0].quantity), 1);
}

#[tokio::test]
async fn test_second_submit_rejected_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        submit_gate: Some(gate.clone()),
        ..FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)])
    });
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    session.add_product("SKU-A", 1).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();
    session.to_verifying().unwrap();

    let (first, second) = tokio::join!(session.submit_order(), async {
        let second = session.submit_order().await;
        let edit = session.add_product("SKU-A", 1);
        gate.notify_one();
        (second, edit)
    });

    assert!(first.is_ok());
    assert!(matches!(
        second.0,
        Err(ClientError::Checkout(CheckoutError::SubmissionInFlight))
    ));
    assert!(matches!(
        second.1,
        Err(ClientError::Checkout(CheckoutError::SubmissionInFlight))
    ));
    assert_eq!(backend.recorded(|r| r.orders.len()), 1);
}

#[tokio::test]
async fn test_cart_locked_while_verifying() {
    let backend = Arc::new(FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)]));
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    session.add_product("SKU-A", 1).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();
    session.to_verifying().unwrap();

    assert!(matches!(
        session.add_product("SKU-A", 1),
        Err(ClientError::Checkout(CheckoutError::InvalidTransition { .. }))
    ));

    session.back_to_selecting().unwrap();
    assert_eq!(session.add_product("SKU-A", 1).unwrap(), 2);
}

#[tokio::test]
async fn test_checkout_needs_a_store() {
    let backend = Arc::new(FakeBackend::with_stock(StoreContext::Hq, &[("SKU-A", 500, 40)]));
    let session = session(&backend, StoreContext::Hq, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    session.add_product("SKU-A", 1).unwrap();
    session.set_customer(Some("Jane"), None).unwrap();

    match session.to_verifying().unwrap_err() {
        ClientError::Checkout(CheckoutError::PreconditionsFailed(failed)) => {
            assert_eq!(failed, vec![CheckoutPrecondition::NoStoreSelected]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Bundles
// =============================================================================

#[tokio::test]
async fn test_bundle_explosion_partial_and_atomic() {
    let backend = Arc::new(FakeBackend::with_stock(
        STORE,
        &[("SKU-A", 300, 2), ("SKU-B", 150, 5)],
    ));
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    let bundle = Bundle::new(
        "BND-1",
        "Back to School",
        Money::from_cents(600),
        vec![
            BundleComponent::new("SKU-A", 1),
            BundleComponent::new("SKU-B", 2),
            BundleComponent::new("SKU-Z", 1),
        ],
    )
    .unwrap();

    let resolution = session.add_bundle(&bundle).unwrap();
    assert!(resolution.is_partial());
    assert_eq!(resolution.missing, vec!["SKU-Z".to_string()]);

    session.add_bundle(&bundle).unwrap();
    let cart = session.cart();
    assert_eq!(cart.quantity_of("SKU-A"), 2);
    assert_eq!(cart.quantity_of("SKU-B"), 4);
    assert_eq!(cart.total(), Money::from_cents(1200));

    // A third copy needs a third SKU-A
    let err = session.add_bundle(&bundle).unwrap_err();
    assert!(matches!(err, ClientError::Core(CoreError::StockExceeded { .. })));
    assert_eq!(session.cart(), cart);
}

// =============================================================================
// Store context & stock snapshots
// =============================================================================

#[tokio::test]
async fn test_switch_context_keeps_cart_and_selection() {
    let backend = Arc::new(FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)]));
    backend.set_stock(StoreContext::Hq, &[("SKU-A", 500, 100)]);
    let session = session(&backend, STORE, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    session.add_product("SKU-A", 2).unwrap();
    session.toggle_selection("SKU-A");

    let snapshot = session.switch_context(StoreContext::Hq).await.unwrap();
    assert_eq!(snapshot.context(), StoreContext::Hq);
    assert_eq!(snapshot.available("SKU-A"), 100);
    assert_eq!(session.cart().quantity_of("SKU-A"), 2);
    assert!(session.selection().contains("SKU-A"));
}

#[tokio::test]
async fn test_stale_snapshot_is_discarded() {
    let gate = Arc::new(Notify::new());
    let first_store = StoreContext::Store(StoreId(1));
    let backend = Arc::new(FakeBackend {
        stock_gate: Some((first_store, gate.clone())),
        ..FakeBackend::with_stock(first_store, &[("SKU-A", 500, 1)])
    });
    backend.set_stock(STORE, &[("SKU-A", 500, 9)]);
    let session = session(&backend, first_store, Capabilities::read_only());

    let (stale, fresh) = tokio::join!(session.reload_stock(), async {
        let fresh = session.switch_context(STORE).await;
        gate.notify_one();
        fresh
    });

    assert!(matches!(stale, Err(ClientError::SnapshotSuperseded(ctx)) if ctx == first_store));
    assert_eq!(fresh.unwrap().available("SKU-A"), 9);

    let installed = session.snapshot().unwrap();
    assert_eq!(installed.context(), STORE);
    assert_eq!(installed.available("SKU-A"), 9);
}

#[tokio::test]
async fn test_add_before_stock_loaded() {
    let backend = Arc::new(FakeBackend::with_stock(STORE, &[("SKU-A", 500, 4)]));
    let session = session(&backend, STORE, Capabilities::read_only());

    assert!(matches!(
        session.add_product("SKU-A", 1),
        Err(ClientError::SnapshotNotLoaded(ctx)) if ctx == STORE
    ));

    session.reload_stock().await.unwrap();
    assert!(matches!(
        session.add_product("SKU-NOPE", 1),
        Err(ClientError::Core(CoreError::ProductNotFound(_)))
    ));
}

// =============================================================================
// Selection & transfers
// =============================================================================

#[tokio::test]
async fn test_allocate_and_return_clear_selection() {
    let backend = Arc::new(FakeBackend::with_stock(
        StoreContext::Hq,
        &[("SKU-A", 500, 40), ("SKU-B", 200, 40), ("PEN-1", 100, 40)],
    ));
    backend.set_stock(STORE, &[("SKU-A", 500, 5)]);
    let session = session(&backend, StoreContext::Hq, Capabilities::read_only());
    session.reload_stock().await.unwrap();

    let selected = session.toggle_select_all("sku-", &SearchField::Sku).unwrap();
    assert_eq!(selected.len(), 2);

    let request = session.allocate_selection(StoreId(2), 5).await.unwrap();
    assert_eq!(request.direction, TransferDirection::Allocate);
    assert_eq!(request.store_id, StoreId(2));
    assert_eq!(request.items.len(), 2);
    assert!(request.items.iter().all(|item| item.quantity == 5));
    assert!(session.selection().is_empty());

    session.switch_context(STORE).await.unwrap();
    session.toggle_selection("SKU-A");
    let request = session.return_selection(1).await.unwrap();
    assert_eq!(request.direction, TransferDirection::Return);
    assert_eq!(request.store_id, StoreId(2));
    assert!(session.selection().is_empty());

    assert_eq!(backend.recorded(|r| r.transfers.len()), 2);
}

#[tokio::test]
async fn test_wrong_context_and_empty_selection_rejected_locally() {
    let backend = Arc::new(FakeBackend::with_stock(STORE, &[("SKU-A", 500, 5)]));
    let session = session(&backend, STORE, Capabilities::editor());
    session.reload_stock().await.unwrap();

    session.toggle_selection("SKU-A");
    assert!(matches!(
        session.allocate_selection(StoreId(3), 1).await,
        Err(ClientError::Core(CoreError::InvalidContextOperation {
            operation: Operation::Allocate,
            ..
        }))
    ));
    assert!(session.selection().contains("SKU-A"));

    session.clear_selection();
    assert!(matches!(
        session.return_selection(1).await,
        Err(ClientError::Core(CoreError::EmptySelection))
    ));

    assert_eq!(backend.recorded(|r| r.transfers.len()), 0);
}

#[tokio::test]
async fn test_concurrent_transfer_rejected() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        submit_gate: Some(gate.clone()),
        ..FakeBackend::with_stock(StoreContext::Hq, &[("SKU-A", 500, 40)])
    });
    let session = session(&backend, StoreContext::Hq, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    session.toggle_selection("SKU-A");

    let (first, second) = tokio::join!(session.allocate_selection(StoreId(2), 1), async {
        let second = session.allocate_selection(StoreId(3), 1).await;
        gate.notify_one();
        second
    });

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(ClientError::OperationInFlight(Operation::Allocate))
    ));
    assert_eq!(backend.recorded(|r| r.transfers.len()), 1);
}

#[tokio::test]
async fn test_rows_selected_during_transfer_stay_selected() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        submit_gate: Some(gate.clone()),
        ..FakeBackend::with_stock(StoreContext::Hq, &[("SKU-A", 500, 40), ("SKU-B", 200, 40)])
    });
    let session = session(&backend, StoreContext::Hq, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    session.toggle_selection("SKU-A");

    let (request, _) = tokio::join!(session.allocate_selection(StoreId(2), 3), async {
        session.toggle_selection("SKU-B");
        gate.notify_one();
    });

    let request = request.unwrap();
    assert_eq!(request.items.len(), 1);
    assert_eq!(request.items[0].sku, "SKU-A");

    let selection = session.selection();
    assert!(!selection.contains("SKU-A"));
    assert!(selection.contains("SKU-B"));
}

#[tokio::test]
async fn test_overlong_search_query_is_rejected() {
    let backend = Arc::new(FakeBackend::with_stock(StoreContext::Hq, &[("SKU-A", 500, 40)]));
    let session = session(&backend, StoreContext::Hq, Capabilities::read_only());
    session.reload_stock().await.unwrap();
    let query = "a".repeat(101);

    assert!(matches!(
        session.visible_products(&query, &SearchField::All),
        Err(ClientError::Core(CoreError::Validation(ValidationError::TooLong { max: 100, .. })))
    ));
    assert!(matches!(
        session.toggle_select_all(&query, &SearchField::All),
        Err(ClientError::Core(CoreError::Validation(_)))
    ));
    assert!(session.selection().is_empty());

    // Surrounding whitespace is trimmed before matching
    let visible = session.visible_products("  sku-a  ", &SearchField::Sku).unwrap();
    assert_eq!(visible.len(), 1);
}

// =============================================================================
// Catalog authoring & reconciliation
// =============================================================================

#[tokio::test]
async fn test_create_bundle_from_selection_needs_edit() {
    let backend = Arc::new(FakeBackend::with_stock(
        StoreContext::Hq,
        &[("SKU-A", 500, 40), ("SKU-B", 200, 40)],
    ));
    let draft = BundleDraft {
        sku: " BND-7 ".into(),
        name: "Starter Kit".into(),
        price: Money::from_cents(650),
        description: Some("   ".into()),
    };

    let read_only = session(&backend, StoreContext::Hq, Capabilities::read_only());
    read_only.toggle_selection("SKU-A");
    assert!(matches!(
        read_only.create_bundle_from_selection(&draft, 1).await,
        Err(ClientError::Core(CoreError::NotPermitted { .. }))
    ));

    let editor = session(&backend, StoreContext::Hq, Capabilities::editor());
    editor.toggle_selection("SKU-A");
    editor.toggle_selection("SKU-B");
    let bundle = editor.create_bundle_from_selection(&draft, 2).await.unwrap();

    assert_eq!(bundle.sku, "BND-7");
    assert!(bundle.description.is_none());
    assert_eq!(bundle.components.len(), 2);
    assert!(bundle.components.iter().all(|c| c.quantity == 2));
    assert!(editor.selection().is_empty());
    assert_eq!(backend.recorded(|r| r.bundles.len()), 1);
}

#[tokio::test]
async fn test_create_product_from_hq() {
    let backend = Arc::new(FakeBackend::default());
    let product = NewProduct {
        sku: "BK-001".into(),
        name: "Rust in Action".into(),
        price: Money::from_cents(4500),
        details: ProductDetails::Generic,
    };

    let store_session = session(&backend, STORE, Capabilities::editor());
    assert!(matches!(
        store_session.create_product(&product).await,
        Err(ClientError::Core(CoreError::InvalidContextOperation { .. }))
    ));

    let hq_session = session(&backend, StoreContext::Hq, Capabilities::editor());
    let created = hq_session.create_product(&product).await.unwrap();
    assert_eq!(created.id, Some(99));
    assert_eq!(created.sku, "BK-001");
}

#[tokio::test]
async fn test_reconcile_passes_report_through() {
    let backend = Arc::new(FakeBackend::default());

    let hq = session(&backend, StoreContext::Hq, Capabilities::editor());
    assert!(matches!(
        hq.reconcile(true).await,
        Err(ClientError::Core(CoreError::InvalidContextOperation {
            operation: Operation::Reconcile,
            ..
        }))
    ));

    let store = session(&backend, STORE, Capabilities::read_only());
    let report = store.reconcile(false).await.unwrap();
    assert_eq!(report, sample_report(StoreId(2)));
}

// =============================================================================
// HQ stock receipts, stores & order search
// =============================================================================

#[tokio::test]
async fn test_receive_stock_at_hq_reloads_snapshot() {
    let backend = Arc::new(FakeBackend::with_stock(StoreContext::Hq, &[("BK-001", 4500, 10)]));
    backend.set_stock(STORE, &[("BK-001", 4500, 2)]);

    let store = session(&backend, STORE, Capabilities::editor());
    assert!(matches!(
        store.receive_stock("BK-001", 5).await,
        Err(ClientError::Core(CoreError::InvalidContextOperation {
            operation: Operation::ReceiveStock,
            ..
        }))
    ));

    let read_only = session(&backend, StoreContext::Hq, Capabilities::read_only());
    assert!(matches!(
        read_only.receive_stock("BK-001", 5).await,
        Err(ClientError::Core(CoreError::NotPermitted {
            operation: Operation::ReceiveStock
        }))
    ));

    let hq = session(&backend, StoreContext::Hq, Capabilities::editor());
    hq.reload_stock().await.unwrap();
    assert!(matches!(
        hq.receive_stock("BK-001", 0).await,
        Err(ClientError::Core(CoreError::Validation(_)))
    ));
    assert_eq!(backend.recorded(|r| r.receipts.len()), 0);

    let receipt = hq.receive_stock(" BK-001 ", 25).await.unwrap();
    assert_eq!(receipt.sku, "BK-001");
    assert_eq!(hq.snapshot().unwrap().available("BK-001"), 35);
    assert_eq!(backend.recorded(|r| r.receipts.len()), 1);
}

#[tokio::test]
async fn test_create_store_from_hq() {
    let backend = Arc::new(FakeBackend::default());

    let store_session = session(&backend, STORE, Capabilities::editor());
    assert!(matches!(
        store_session.create_store("Kiosk").await,
        Err(ClientError::Core(CoreError::InvalidContextOperation { .. }))
    ));

    let hq = session(&backend, StoreContext::Hq, Capabilities::editor());
    assert!(matches!(
        hq.create_store("   ").await,
        Err(ClientError::Core(CoreError::Validation(ValidationError::Required { .. })))
    ));

    let created = hq.create_store("  Campus Pop-up ").await.unwrap();
    assert_eq!(created.id, StoreId(11));
    assert_eq!(created.name, "Campus Pop-up");
    assert_eq!(created.kind, StoreKind::Virtual);
    assert_eq!(backend.recorded(|r| r.stores[0].name.clone()), "Campus Pop-up");
}

#[tokio::test]
async fn test_order_search_by_customer() {
    let backend = Arc::new(FakeBackend::default());
    let session = session(&backend, STORE, Capabilities::read_only());

    let all = session.list_orders(&OrderQuery::default()).await.unwrap();
    assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![8, 7]);

    let query = OrderQuery::new(Some(" jane "), Some(""));
    let found = session.list_orders(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].customer.name.as_deref(), Some("Jane Doe"));

    let sent = backend.recorded(|r| r.order_queries[1].clone());
    assert_eq!(sent.customer_name.as_deref(), Some("jane"));
    assert_eq!(sent.customer_phone, None);
}
