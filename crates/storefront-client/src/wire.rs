//! # Wire Format
//!
//! DTOs exactly as the storefront service sends and accepts them, plus the
//! conversions to and from engine types.
//!
//! ## Boundary Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service JSON                          Engine                           │
//! │  ────────────                          ──────                           │
//! │  "price": 12.99 / "12.99"   ────────►  Money(1299)                      │
//! │  "type": "BOOK"             ────────►  ProductDetails::Book { .. }      │
//! │  "attributes": "{\"type\":\"PENCIL\",..}" ─► ProductDetails::Stationery │
//! │  "quantity": -2             ────────►  available 0                      │
//! │  "price": -5                ────────►  row rejected                     │
//! │  "type": "MASTER"           ────────►  StoreKind::Master                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is camelCase; the engine never sees these structs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use storefront_core::money::{self, Money};
use storefront_core::{
    Bundle, BundleComponent, CustomerInfo, NewBundle, NewProduct, NewStore, OrderLineRequest,
    OrderReceipt, OrderRequest, OrderStatus, OrderSummary, OrderSummaryLine, Product,
    ProductDetails, ReconciliationLogEntry, ReconciliationReport, StockEntry, StockReceipt,
    Store, StoreId, StoreKind, TransferItem, ValidationError,
};
use storefront_core::validation::validate_price;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Product attributes
// =============================================================================

/// Attribute payload as the service stores it, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributesDto {
    #[serde(rename_all = "camelCase")]
    Book {
        #[serde(default)]
        author: Option<String>,
        #[serde(default)]
        publication_date: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        isbn: Option<String>,
        #[serde(default)]
        genre: Option<String>,
        #[serde(default)]
        publisher: Option<String>,
    },
    #[serde(rename_all = "camelCase", alias = "STATIONERY")]
    Pencil {
        #[serde(default)]
        hardness: Option<String>,
        #[serde(default)]
        brand: Option<String>,
        #[serde(default)]
        eraser_included: Option<bool>,
        #[serde(default)]
        material: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Apparel {
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        material: Option<String>,
        #[serde(default)]
        brand: Option<String>,
        #[serde(default)]
        gender: Option<String>,
    },
}

impl From<AttributesDto> for ProductDetails {
    fn from(dto: AttributesDto) -> Self {
        match dto {
            AttributesDto::Book {
                author,
                publication_date,
                description,
                isbn,
                genre,
                publisher,
            } => ProductDetails::Book {
                author,
                isbn,
                publisher,
                genre,
                publication_date,
                description,
            },
            AttributesDto::Pencil {
                hardness,
                brand,
                eraser_included,
                material,
            } => ProductDetails::Stationery {
                brand,
                hardness,
                material,
                eraser_included,
            },
            AttributesDto::Apparel {
                size,
                color,
                material,
                brand,
                gender,
            } => ProductDetails::Apparel {
                size,
                color,
                material,
                brand,
                gender,
            },
        }
    }
}

impl AttributesDto {
    fn from_details(details: &ProductDetails) -> Option<Self> {
        match details.clone() {
            ProductDetails::Book {
                author,
                isbn,
                publisher,
                genre,
                publication_date,
                description,
            } => Some(AttributesDto::Book {
                author,
                publication_date,
                description,
                isbn,
                genre,
                publisher,
            }),
            ProductDetails::Stationery {
                brand,
                hardness,
                material,
                eraser_included,
            } => Some(AttributesDto::Pencil {
                hardness,
                brand,
                eraser_included,
                material,
            }),
            ProductDetails::Apparel {
                size,
                color,
                material,
                brand,
                gender,
            } => Some(AttributesDto::Apparel {
                size,
                color,
                material,
                brand,
                gender,
            }),
            ProductDetails::Generic => None,
        }
    }
}

/// Product `type` column to an attribute-less details value.
fn details_for_type(type_tag: Option<&str>) -> ProductDetails {
    match type_tag.map(|t| t.trim().to_ascii_uppercase()).as_deref() {
        Some("BOOK") => ProductDetails::Book {
            author: None,
            isbn: None,
            publisher: None,
            genre: None,
            publication_date: None,
            description: None,
        },
        Some("STATIONERY") | Some("PENCIL") => ProductDetails::Stationery {
            brand: None,
            hardness: None,
            material: None,
            eraser_included: None,
        },
        Some("APPAREL") => ProductDetails::Apparel {
            size: None,
            color: None,
            material: None,
            brand: None,
            gender: None,
        },
        _ => ProductDetails::Generic,
    }
}

/// `attributes` arrives either as an object or as a JSON-encoded string.
/// Unreadable attributes degrade to `None` instead of failing the listing.
fn lenient_attributes<'de, D>(deserializer: D) -> Result<Option<AttributesDto>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = match raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(text)) => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => return Ok(None),
        },
        Some(other) => other,
    };
    Ok(serde_json::from_value(value).ok())
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

// =============================================================================
// Products & stock
// =============================================================================

/// `Product` entity as returned by `/inventory/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(default)]
    pub id: Option<i64>,
    pub sku: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_tag: Option<String>,
    #[serde(alias = "price", with = "money::decimal")]
    pub base_price: Money,
    #[serde(default, deserialize_with = "lenient_attributes")]
    pub attributes: Option<AttributesDto>,
}

impl TryFrom<ProductDto> for Product {
    type Error = ValidationError;

    fn try_from(dto: ProductDto) -> Result<Self, Self::Error> {
        validate_price(dto.base_price)?;
        let details = match dto.attributes {
            Some(attributes) => attributes.into(),
            None => details_for_type(dto.type_tag.as_deref()),
        };
        Ok(Product {
            id: dto.id,
            sku: dto.sku,
            name: dto.name,
            price: dto.base_price,
            details,
        })
    }
}

/// One row of `/inventory/view`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockDto {
    #[serde(default)]
    pub id: Option<i64>,
    pub sku: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_tag: Option<String>,
    #[serde(with = "money::decimal")]
    pub price: Money,
    #[serde(default)]
    pub quantity: i64,
}

impl TryFrom<ProductStockDto> for StockEntry {
    type Error = ValidationError;

    fn try_from(dto: ProductStockDto) -> Result<Self, Self::Error> {
        validate_price(dto.price)?;
        let product = Product {
            id: dto.id,
            sku: dto.sku,
            name: dto.name,
            price: dto.price,
            details: details_for_type(dto.type_tag.as_deref()),
        };
        Ok(StockEntry::new(product, clamp_quantity(dto.quantity)))
    }
}

/// Body of `POST /inventory/stock`.
#[derive(Debug, Clone, Serialize)]
pub struct StockIngestDto {
    pub sku: String,
    pub quantity: u32,
}

impl From<&StockReceipt> for StockIngestDto {
    fn from(receipt: &StockReceipt) -> Self {
        StockIngestDto {
            sku: receipt.sku.clone(),
            quantity: receipt.quantity,
        }
    }
}

/// Body of `POST /inventory/products`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductDto {
    pub sku: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(with = "money::decimal")]
    pub base_price: Money,
    /// JSON-encoded attributes; the service stores them as text.
    pub attributes: Option<String>,
}

impl CreateProductDto {
    pub fn from_new(product: &NewProduct) -> ClientResult<Self> {
        let attributes = AttributesDto::from_details(&product.details)
            .map(|a| serde_json::to_string(&a))
            .transpose()
            .map_err(|e| ClientError::InvalidConfig(format!("unencodable attributes: {}", e)))?;

        Ok(CreateProductDto {
            sku: product.sku.clone(),
            name: product.name.clone(),
            type_tag: product.details.kind().to_string(),
            base_price: product.price,
            attributes,
        })
    }
}

// =============================================================================
// Bundles
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleItemDto {
    pub product_sku: String,
    pub quantity: i64,
}

/// `BundleViewDTO` from `GET /inventory/bundles`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleViewDto {
    #[serde(default)]
    pub id: Option<i64>,
    pub sku: String,
    pub name: String,
    #[serde(with = "money::decimal")]
    pub price: Money,
    #[serde(default)]
    pub items: Vec<BundleItemDto>,
}

impl BundleViewDto {
    /// `None` for bundles the engine cannot use (no valid components or a
    /// bad price).
    pub fn into_bundle(self) -> Option<Bundle> {
        let components = self
            .items
            .into_iter()
            .filter(|item| item.quantity > 0)
            .map(|item| BundleComponent::new(item.product_sku, clamp_quantity(item.quantity)))
            .collect();

        let bundle = Bundle::new(self.sku, self.name, self.price, components).ok()?;
        Some(match self.id {
            Some(id) => bundle.with_id(id),
            None => bundle,
        })
    }
}

/// Body of `POST /inventory/bundles`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBundleDto {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "money::decimal")]
    pub price: Money,
    pub items: Vec<BundleItemDto>,
}

impl From<&NewBundle> for CreateBundleDto {
    fn from(bundle: &NewBundle) -> Self {
        CreateBundleDto {
            sku: bundle.sku.clone(),
            name: bundle.name.clone(),
            description: bundle.description.clone(),
            price: bundle.price,
            items: bundle
                .components
                .iter()
                .map(|c| BundleItemDto {
                    product_sku: c.product_sku.clone(),
                    quantity: i64::from(c.quantity),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Stores
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default = "unknown_kind")]
    pub kind: StoreKind,
    #[serde(default)]
    pub location: Option<String>,
}

fn unknown_kind() -> StoreKind {
    StoreKind::Unknown
}

impl From<StoreDto> for Store {
    fn from(dto: StoreDto) -> Self {
        Store {
            id: StoreId(dto.id),
            name: dto.name,
            kind: dto.kind,
            location: dto.location,
        }
    }
}

/// Body of `POST /stores`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateStoreDto {
    pub name: String,
}

impl From<&NewStore> for CreateStoreDto {
    fn from(store: &NewStore) -> Self {
        CreateStoreDto {
            name: store.name.clone(),
        }
    }
}

// =============================================================================
// Orders & transfers
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub sku: String,
    pub quantity: u32,
}

impl From<&OrderLineRequest> for OrderItemDto {
    fn from(line: &OrderLineRequest) -> Self {
        OrderItemDto {
            sku: line.sku.clone(),
            quantity: line.quantity,
        }
    }
}

impl From<&TransferItem> for OrderItemDto {
    fn from(item: &TransferItem) -> Self {
        OrderItemDto {
            sku: item.sku.clone(),
            quantity: item.quantity,
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestDto {
    pub store_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItemDto>,
}

impl From<&OrderRequest> for OrderRequestDto {
    fn from(order: &OrderRequest) -> Self {
        OrderRequestDto {
            store_id: order.store_id.0,
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            items: order.items.iter().map(OrderItemDto::from).collect(),
        }
    }
}

/// The parts of `CustomerOrder` the engine reads back.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedDto {
    pub id: i64,
    #[serde(default, with = "money::decimal::option")]
    pub total_amount: Option<Money>,
}

impl From<OrderCreatedDto> for OrderReceipt {
    fn from(dto: OrderCreatedDto) -> Self {
        OrderReceipt {
            order_id: dto.id,
            total: dto.total_amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Product or bundle reference inside an order line.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemRefDto {
    pub sku: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    #[serde(default)]
    pub product: Option<LineItemRefDto>,
    #[serde(default)]
    pub bundle: Option<LineItemRefDto>,
    #[serde(default, with = "money::decimal::option")]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub quantity: i64,
}

/// `CustomerOrder` as listed by `GET /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    #[serde(default)]
    pub store: Option<StoreRefDto>,
    #[serde(default)]
    pub customer: Option<CustomerDto>,
    #[serde(with = "money::decimal")]
    pub total_amount: Money,
    #[serde(default = "unknown_status")]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub order_lines: Vec<OrderLineDto>,
}

fn unknown_status() -> OrderStatus {
    OrderStatus::Unknown
}

impl From<OrderDto> for OrderSummary {
    fn from(dto: OrderDto) -> Self {
        let customer = dto
            .customer
            .map(|c| CustomerInfo::new(c.name.as_deref(), c.phone.as_deref()))
            .unwrap_or_default();

        // Lines that reference neither a product nor a bundle carry nothing to show
        let lines = dto
            .order_lines
            .into_iter()
            .filter_map(|line| {
                let item = line.product.or(line.bundle)?;
                Some(OrderSummaryLine {
                    sku: item.sku,
                    name: item.name,
                    quantity: clamp_quantity(line.quantity),
                    unit_price: line.unit_price.unwrap_or_default(),
                })
            })
            .collect();

        OrderSummary {
            id: dto.id,
            store_id: dto.store.as_ref().map(|s| StoreId(s.id)),
            store_name: dto.store.and_then(|s| s.name),
            customer,
            total: dto.total_amount,
            status: dto.status,
            created_at: dto.created_at.map(|t| t.and_utc()),
            lines,
        }
    }
}

/// Body of allocate / return.
#[derive(Debug, Clone, Serialize)]
pub struct TransferItemsDto {
    pub items: Vec<OrderItemDto>,
}

// =============================================================================
// Reconciliation
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRefDto {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRefDto {
    #[serde(default)]
    pub username: Option<String>,
}

/// `ReconciliationLog` entity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationLogDto {
    pub id: i64,
    #[serde(default)]
    pub store: Option<StoreRefDto>,
    #[serde(default)]
    pub reconciled_by: Option<UserRefDto>,
    #[serde(with = "money::decimal")]
    pub total_revenue: Money,
    #[serde(default)]
    pub total_items_sold: i64,
    #[serde(default)]
    pub inventory_returned: bool,
    #[serde(default)]
    pub details_json: Option<String>,
    pub reconciled_at: NaiveDateTime,
}

impl ReconciliationLogDto {
    /// `store` is the store being queried; the log's own store wins if present.
    pub fn into_entry(self, store: StoreId) -> ReconciliationLogEntry {
        let report = self
            .details_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<ReconciliationReport>(json).ok());

        ReconciliationLogEntry {
            id: self.id,
            store_id: self.store.map(|s| StoreId(s.id)).unwrap_or(store),
            reconciled_at: self.reconciled_at.and_utc(),
            total_revenue: self.total_revenue,
            total_items_sold: clamp_quantity(self.total_items_sold),
            inventory_returned: self.inventory_returned,
            reconciled_by: self.reconciled_by.and_then(|u| u.username),
            report,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
