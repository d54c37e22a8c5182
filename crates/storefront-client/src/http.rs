//! # HTTP Backend
//!
//! `StorefrontBackend` over the service's REST API (`{base}/api/v1/...`).
//!
//! ## Endpoints
//! ```text
//! ┌──────────────────────────────────────────┬──────────────────────────────┐
//! │ Request                                  │ Used by                      │
//! ├──────────────────────────────────────────┼──────────────────────────────┤
//! │ GET  stores                              │ list_stores                  │
//! │ GET  inventory/products                  │ list_products                │
//! │ GET  inventory/bundles                   │ list_bundles                 │
//! │ GET  inventory/view[?storeId=N]          │ load_stock                   │
//! │ GET  orders[?customerName=&customerPhone]│ list_orders                  │
//! │ POST orders                              │ create_order                 │
//! │ POST stores/{id}/allocate | return       │ transfer_stock               │
//! │ POST inventory/bundles                   │ create_bundle                │
//! │ POST inventory/products                  │ create_product               │
//! │ POST inventory/stock                     │ receive_stock                │
//! │ POST stores                              │ create_store                 │
//! │ POST stores/{id}/reconcile?returnStock=  │ reconcile_store              │
//! │ GET  stores/{id}/reconciliations         │ reconciliation_history       │
//! │ GET  orders/reconciliation-summary       │ order_reconciliation_summary │
//! └──────────────────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Error Mapping
//! - Non-2xx → `RemoteRejected { status, message }`, where `message` is the
//!   body's `message` (or `error`) field, else the raw body text
//! - Connect/timeout failures → `NetworkFailure`
//! - Unreadable 2xx body → `DeserializationFailed`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_core::{
    Bundle, CoreError, NewBundle, NewProduct, NewStore, OrderQuery, OrderReceipt,
    OrderReconciliationSummary, OrderRequest, OrderSummary, Product, ReconciliationLogEntry,
    ReconciliationReport, StockEntry, StockReceipt, Store, StoreContext, StoreId,
    TransferDirection, TransferRequest,
};
use tracing::{debug, warn};
use url::Url;

use crate::backend::StorefrontBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::wire::{
    BundleViewDto, CreateBundleDto, CreateProductDto, CreateStoreDto, OrderCreatedDto, OrderDto,
    OrderItemDto, OrderRequestDto, ProductDto, ProductStockDto, ReconciliationLogDto,
    StockIngestDto, StoreDto, TransferItemsDto,
};

/// REST client for the storefront service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    api_root: Url,
    token: Option<String>,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url` (the `/api/v1` suffix is added).
    pub fn new(base_url: &Url, token: Option<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpBackend {
            client,
            api_root: api_root(base_url)?,
            token,
        })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(
            &config.base_url()?,
            config.server.token.clone(),
            config.timeout(),
        )
    }

    /// The resolved `.../api/v1/` root.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.api_root.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        warn!(status = status.as_u16(), %message, "Storefront service rejected request");

        Err(ClientError::RemoteRejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(%url, "GET");
        let response = self.send(self.request(Method::GET, url)).await?;
        Self::read_json(response).await
    }

    async fn post<B: Serialize + ?Sized>(&self, url: Url, body: Option<&B>) -> ClientResult<Response> {
        debug!(%url, "POST");
        let builder = self.request(Method::POST, url);
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        self.send(builder).await
    }
}

/// `base` with a trailing slash, joined with `api/v1/`.
fn api_root(base: &Url) -> ClientResult<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("api/v1/")?)
}

/// The server's own words: JSON `message`/`error`, else the trimmed text.
fn rejection_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                if !text.trim().is_empty() {
                    return Some(text.clone());
                }
            }
        }
    }

    Some(body.to_string())
}

#[async_trait]
impl StorefrontBackend for HttpBackend {
    async fn list_stores(&self) -> ClientResult<Vec<Store>> {
        let stores: Vec<StoreDto> = self.get_json(self.endpoint("stores")?).await?;
        Ok(stores.into_iter().map(Store::from).collect())
    }

    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let products: Vec<ProductDto> = self.get_json(self.endpoint("inventory/products")?).await?;
        Ok(products
            .into_iter()
            .filter_map(|dto| {
                let sku = dto.sku.clone();
                Product::try_from(dto)
                    .map_err(|e| warn!(%sku, error = %e, "Skipping product with invalid price"))
                    .ok()
            })
            .collect())
    }

    async fn list_bundles(&self) -> ClientResult<Vec<Bundle>> {
        let bundles: Vec<BundleViewDto> = self.get_json(self.endpoint("inventory/bundles")?).await?;
        Ok(bundles
            .into_iter()
            .filter_map(|dto| {
                let sku = dto.sku.clone();
                let bundle = dto.into_bundle();
                if bundle.is_none() {
                    warn!(%sku, "Skipping bundle without usable components");
                }
                bundle
            })
            .collect())
    }

    async fn load_stock(&self, context: StoreContext) -> ClientResult<Vec<StockEntry>> {
        let mut url = self.endpoint("inventory/view")?;
        if let StoreContext::Store(id) = context {
            url.query_pairs_mut().append_pair("storeId", &id.to_string());
        }
        let rows: Vec<ProductStockDto> = self.get_json(url).await?;
        Ok(rows
            .into_iter()
            .filter_map(|dto| {
                let sku = dto.sku.clone();
                StockEntry::try_from(dto)
                    .map_err(|e| warn!(%sku, error = %e, "Skipping stock row with invalid price"))
                    .ok()
            })
            .collect())
    }

    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<OrderSummary>> {
        let mut url = self.endpoint("orders")?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if let Some(name) = &query.customer_name {
                pairs.append_pair("customerName", name);
            }
            if let Some(phone) = &query.customer_phone {
                pairs.append_pair("customerPhone", phone);
            }
        }
        let orders: Vec<OrderDto> = self.get_json(url).await?;
        Ok(orders.into_iter().map(OrderSummary::from).collect())
    }

    async fn create_order(&self, order: &OrderRequest) -> ClientResult<OrderReceipt> {
        let body = OrderRequestDto::from(order);
        let response = self.post(self.endpoint("orders")?, Some(&body)).await?;
        let created: OrderCreatedDto = Self::read_json(response).await?;
        Ok(created.into())
    }

    async fn transfer_stock(&self, request: &TransferRequest) -> ClientResult<()> {
        let action = match request.direction {
            TransferDirection::Allocate => "allocate",
            TransferDirection::Return => "return",
        };
        let url = self.endpoint(&format!("stores/{}/{}", request.store_id, action))?;
        let body = TransferItemsDto {
            items: request.items.iter().map(OrderItemDto::from).collect(),
        };
        self.post(url, Some(&body)).await?;
        Ok(())
    }

    async fn create_bundle(&self, bundle: &NewBundle) -> ClientResult<()> {
        let body = CreateBundleDto::from(bundle);
        self.post(self.endpoint("inventory/bundles")?, Some(&body)).await?;
        Ok(())
    }

    async fn create_product(&self, product: &NewProduct) -> ClientResult<Product> {
        let body = CreateProductDto::from_new(product)?;
        let response = self.post(self.endpoint("inventory/products")?, Some(&body)).await?;
        let created: ProductDto = Self::read_json(response).await?;
        Ok(Product::try_from(created).map_err(CoreError::from)?)
    }

    async fn receive_stock(&self, receipt: &StockReceipt) -> ClientResult<()> {
        let body = StockIngestDto::from(receipt);
        self.post(self.endpoint("inventory/stock")?, Some(&body)).await?;
        Ok(())
    }

    async fn create_store(&self, store: &NewStore) -> ClientResult<Store> {
        let body = CreateStoreDto::from(store);
        let response = self.post(self.endpoint("stores")?, Some(&body)).await?;
        let created: StoreDto = Self::read_json(response).await?;
        Ok(created.into())
    }

    async fn reconcile_store(
        &self,
        store: StoreId,
        return_stock: bool,
    ) -> ClientResult<ReconciliationReport> {
        let mut url = self.endpoint(&format!("stores/{}/reconcile", store))?;
        url.query_pairs_mut()
            .append_pair("returnStock", if return_stock { "true" } else { "false" });
        let response = self.post::<()>(url, None).await?;
        Self::read_json(response).await
    }

    async fn reconciliation_history(
        &self,
        store: StoreId,
    ) -> ClientResult<Vec<ReconciliationLogEntry>> {
        let url = self.endpoint(&format!("stores/{}/reconciliations", store))?;
        let logs: Vec<ReconciliationLogDto> = self.get_json(url).await?;
        Ok(logs.into_iter().map(|log| log.into_entry(store)).collect())
    }

    async fn order_reconciliation_summary(
        &self,
        store: Option<StoreId>,
    ) -> ClientResult<OrderReconciliationSummary> {
        let mut url = self.endpoint("orders/reconciliation-summary")?;
        if let Some(id) = store {
            url.query_pairs_mut().append_pair("storeId", &id.to_string());
        }
        self.get_json(url).await
    }
}
