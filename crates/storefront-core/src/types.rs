//! # Domain Types
//!
//! Core domain types used throughout the storefront engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Bundle      │   │     Store       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (identity) │   │  sku            │   │  id (StoreId)   │       │
//! │  │  name           │   │  price          │   │  name           │       │
//! │  │  price (Money)  │   │  components ──┐ │   │  kind           │       │
//! │  │  details ───┐   │   └───────────────┼─┘   └─────────────────┘       │
//! │  └─────────────┼───┘                   │                                │
//! │                ▼                       ▼                                │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                     │
//! │  │  ProductDetails     │   │  BundleComponent    │                     │
//! │  │  Book | Stationery  │   │  product_sku        │                     │
//! │  │  Apparel | Generic  │   │  quantity (≥ 1)     │                     │
//! │  └─────────────────────┘   └─────────────────────┘                     │
//! │                                                                         │
//! │  Outbound payloads: OrderRequest, TransferRequest, NewBundle,          │
//! │  NewProduct. Inbound pass-through: ReconciliationReport & friends.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! The SKU is the identity of products and bundles everywhere in the engine.
//! Numeric ids assigned by the storefront service are carried along when
//! known but never used as keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{self, Money};
use crate::validation::{
    validate_price, validate_product_name, validate_quantity, validate_sku, validate_store_name,
};

// =============================================================================
// Product
// =============================================================================

/// A sellable product as seen by the engine.
///
/// Immutable to the engine: name and price are copied into cart lines at
/// add time, so later catalog edits never rewrite an open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Service-assigned id, when known.
    pub id: Option<i64>,

    /// Stock Keeping Unit - identity.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Type tag plus type-specific attributes.
    pub details: ProductDetails,
}

impl Product {
    /// Creates a product without type-specific attributes.
    pub fn generic(sku: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Product {
            id: None,
            sku: sku.into(),
            name: name.into(),
            price,
            details: ProductDetails::Generic,
        }
    }

    /// Returns the product's type tag.
    pub fn kind(&self) -> ProductKind {
        self.details.kind()
    }
}

/// Type-specific product attributes.
///
/// A tagged variant keyed by product type. Every attribute is optional
/// because the service accepts partially filled records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ProductDetails {
    Book {
        author: Option<String>,
        isbn: Option<String>,
        publisher: Option<String>,
        genre: Option<String>,
        publication_date: Option<String>,
        description: Option<String>,
    },
    Stationery {
        brand: Option<String>,
        hardness: Option<String>,
        material: Option<String>,
        eraser_included: Option<bool>,
    },
    Apparel {
        size: Option<String>,
        color: Option<String>,
        material: Option<String>,
        brand: Option<String>,
        gender: Option<String>,
    },
    #[default]
    Generic,
}

/// Product type tag without attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ProductKind {
    Book,
    Stationery,
    Apparel,
    Generic,
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProductKind::Book => "BOOK",
            ProductKind::Stationery => "STATIONERY",
            ProductKind::Apparel => "APPAREL",
            ProductKind::Generic => "GENERIC",
        };
        f.write_str(text)
    }
}

impl ProductDetails {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductDetails::Book { .. } => ProductKind::Book,
            ProductDetails::Stationery { .. } => ProductKind::Stationery,
            ProductDetails::Apparel { .. } => ProductKind::Apparel,
            ProductDetails::Generic => ProductKind::Generic,
        }
    }

    /// Looks up an attribute by its display key (case-insensitive).
    ///
    /// Keys accept both `publicationDate` and `publication_date` forms.
    /// Returns `None` when the product type has no such attribute or it
    /// is unset.
    pub fn attribute(&self, key: &str) -> Option<String> {
        let key = key.trim().to_ascii_lowercase().replace('_', "");
        match self {
            ProductDetails::Book {
                author,
                isbn,
                publisher,
                genre,
                publication_date,
                description,
            } => match key.as_str() {
                "author" => author.clone(),
                "isbn" => isbn.clone(),
                "publisher" => publisher.clone(),
                "genre" => genre.clone(),
                "publicationdate" => publication_date.clone(),
                "description" => description.clone(),
                _ => None,
            },
            ProductDetails::Stationery {
                brand,
                hardness,
                material,
                eraser_included,
            } => match key.as_str() {
                "brand" => brand.clone(),
                "hardness" => hardness.clone(),
                "material" => material.clone(),
                "eraserincluded" => eraser_included.map(|b| b.to_string()),
                _ => None,
            },
            ProductDetails::Apparel {
                size,
                color,
                material,
                brand,
                gender,
            } => match key.as_str() {
                "size" => size.clone(),
                "color" | "colour" => color.clone(),
                "material" => material.clone(),
                "brand" => brand.clone(),
                "gender" => gender.clone(),
                _ => None,
            },
            ProductDetails::Generic => None,
        }
    }

    /// Every set attribute value, for free-text search.
    pub fn values(&self) -> Vec<String> {
        let keys: &[&str] = match self {
            ProductDetails::Book { .. } => &[
                "author",
                "isbn",
                "publisher",
                "genre",
                "publicationDate",
                "description",
            ],
            ProductDetails::Stationery { .. } => &["brand", "hardness", "material"],
            ProductDetails::Apparel { .. } => &["size", "color", "material", "brand", "gender"],
            ProductDetails::Generic => &[],
        };
        keys.iter().filter_map(|k| self.attribute(k)).collect()
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// One component of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleComponent {
    pub product_sku: String,
    pub quantity: u32,
}

impl BundleComponent {
    pub fn new(product_sku: impl Into<String>, quantity: u32) -> Self {
        BundleComponent {
            product_sku: product_sku.into(),
            quantity,
        }
    }
}

/// A predefined product bundle.
///
/// The price is informational: under the explosion policy a bundle added to
/// the cart is charged as the sum of its component prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bundle {
    pub id: Option<i64>,
    pub sku: String,
    pub name: String,
    pub price: Money,
    components: Vec<BundleComponent>,
}

impl Bundle {
    /// Creates a bundle, rejecting an empty component list, a zero quantity
    /// or an out-of-range price.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        components: Vec<BundleComponent>,
    ) -> Result<Self, ValidationError> {
        if components.is_empty() {
            return Err(ValidationError::Required {
                field: "bundle components".to_string(),
            });
        }
        if components.iter().any(|c| c.quantity == 0) {
            return Err(ValidationError::MustBePositive {
                field: "component quantity".to_string(),
            });
        }
        validate_price(price)?;

        Ok(Bundle {
            id: None,
            sku: sku.into(),
            name: name.into(),
            price,
            components,
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Components in definition order.
    pub fn components(&self) -> &[BundleComponent] {
        &self.components
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store identifier assigned by the storefront service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreId(pub i64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of store as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StoreKind {
    /// The headquarters stock pool.
    Master,
    Virtual,
    Physical,
    #[serde(other)]
    Unknown,
}

/// A store known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub kind: StoreKind,
    pub location: Option<String>,
}

/// A store to open. The service always creates it as a virtual store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStore {
    pub name: String,
}

impl NewStore {
    /// Trims the name.
    pub fn new(name: &str) -> Self {
        NewStore {
            name: name.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_store_name(&self.name)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Optional customer metadata attached to a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl CustomerInfo {
    /// Builds customer info, turning blank strings into `None`.
    ///
    /// ```rust
    /// use storefront_core::CustomerInfo;
    ///
    /// let customer = CustomerInfo::new(Some("  Jane "), Some("   "));
    /// assert_eq!(customer.name.as_deref(), Some("Jane"));
    /// assert!(customer.phone.is_none());
    /// ```
    pub fn new(name: Option<&str>, phone: Option<&str>) -> Self {
        CustomerInfo {
            name: normalize(name),
            phone: normalize(phone),
        }
    }

    /// True when a non-blank name is present.
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Orders
// =============================================================================

/// One `{sku, quantity}` row of an order or transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineRequest {
    pub sku: String,
    pub quantity: u32,
}

/// The payload submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    pub store_id: StoreId,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

/// What the service returns for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub total: Option<Money>,
}

/// Filters for the order search. Matching is substring and server-side;
/// `None` fields match every order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderQuery {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

impl OrderQuery {
    /// Builds a query, turning blank filters into `None`.
    pub fn new(customer_name: Option<&str>, customer_phone: Option<&str>) -> Self {
        OrderQuery {
            customer_name: normalize(customer_name),
            customer_phone: normalize(customer_phone),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none() && self.customer_phone.is_none()
    }
}

/// Lifecycle state of a recorded order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    Completed,
    Pending,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// One line of a recorded order, product or bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummaryLine {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderSummaryLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A past order as listed by the order search, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummary {
    pub id: i64,
    pub store_id: Option<StoreId>,
    pub store_name: Option<String>,
    pub customer: CustomerInfo,
    pub total: Money,
    pub status: OrderStatus,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderSummaryLine>,
}

// =============================================================================
// Transfers
// =============================================================================

/// Direction of a stock movement between HQ and a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransferDirection {
    /// HQ → store.
    Allocate,
    /// Store → HQ.
    Return,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Allocate => f.write_str("allocate"),
            TransferDirection::Return => f.write_str("return"),
        }
    }
}

/// One row of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferItem {
    pub sku: String,
    pub quantity: u32,
}

/// A batched stock movement.
///
/// `store_id` is the target for an allocation and the source for a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferRequest {
    pub direction: TransferDirection,
    pub store_id: StoreId,
    pub items: Vec<TransferItem>,
}

/// Goods received into the HQ pool from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockReceipt {
    pub sku: String,
    pub quantity: u32,
}

impl StockReceipt {
    pub fn new(sku: &str, quantity: u32) -> Self {
        StockReceipt {
            sku: sku.trim().to_string(),
            quantity,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_sku(&self.sku)?;
        validate_quantity(self.quantity)
    }
}

// =============================================================================
// Catalog authoring
// =============================================================================

/// Operator-entered header for a bundle built from the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleDraft {
    pub sku: String,
    pub name: String,
    pub price: Money,
    pub description: Option<String>,
}

/// A bundle ready to be created on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBundle {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub components: Vec<BundleComponent>,
}

impl NewBundle {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_sku(&self.sku)?;
        validate_product_name(&self.name)?;
        validate_price(self.price)?;

        if self.components.is_empty() {
            return Err(ValidationError::Required {
                field: "bundle components".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for component in &self.components {
            validate_quantity(component.quantity)?;
            if !seen.insert(component.product_sku.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "component".to_string(),
                    value: component.product_sku.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A product ready to be created on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price: Money,
    pub details: ProductDetails,
}

impl NewProduct {
    /// Checks sku, name and price.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_sku(&self.sku)?;
        validate_product_name(&self.name)?;
        validate_price(self.price)
    }

    /// Returns a copy with surrounding whitespace removed from sku and name.
    pub fn normalized(&self) -> NewProduct {
        NewProduct {
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            ..self.clone()
        }
    }
}

// =============================================================================
// Reconciliation (pass-through)
// =============================================================================
// Computed entirely by the service. The engine forwards these untouched, so
// they keep the service's camelCase field names and decimal amounts.

/// Result of reconciling a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub store_id: StoreId,
    pub store_name: String,
    #[serde(with = "money::decimal")]
    pub total_revenue: Money,
    pub total_items_sold: u32,
    #[serde(default)]
    pub sold_items: Vec<ItemSales>,
    #[serde(default)]
    pub returned_items: Vec<ReturnedItem>,
    #[serde(default)]
    pub assigned_admins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSales {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "money::decimal")]
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedItem {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
}

/// One past reconciliation of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationLogEntry {
    pub id: i64,
    pub store_id: StoreId,
    pub reconciled_at: DateTime<Utc>,
    #[serde(with = "money::decimal")]
    pub total_revenue: Money,
    pub total_items_sold: u32,
    pub inventory_returned: bool,
    #[serde(default)]
    pub reconciled_by: Option<String>,
    /// The report stored with the log, when the service kept one.
    #[serde(default)]
    pub report: Option<ReconciliationReport>,
}

/// Aggregate order reconciliation status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReconciliationSummary {
    pub total_orders: u64,
    pub reconciled_orders: u64,
    pub unreconciled_orders: u64,
    #[serde(with = "money::decimal")]
    pub total_amount: Money,
    #[serde(with = "money::decimal")]
    pub reconciled_amount: Money,
    #[serde(with = "money::decimal")]
    pub unreconciled_amount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
