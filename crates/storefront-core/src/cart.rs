//! # Cart (Line Aggregator)
//!
//! Merges product additions into quantity-aggregated lines, never letting a
//! line exceed the stock ceiling of the active snapshot.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action              Engine call            Cart change              │
//! │  ─────────              ───────────            ───────────              │
//! │                                                                         │
//! │  Click product ───────► add_line(p, 1) ──────► line.qty += 1 or push   │
//! │                          │                                              │
//! │                          └─ qty + n > available? → StockExceeded       │
//! │                                                                         │
//! │  Click "−" ───────────► remove_one(sku) ─────► line.qty -= 1           │
//! │                                                 (line dropped at 0)     │
//! │                                                                         │
//! │  Cancel sale ─────────► clear() ─────────────► lines + customer wiped  │
//! │                                                                         │
//! │  NOTE: every check runs before the first write. An Err means the       │
//! │        cart is exactly as it was.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per SKU
//! - Every line has quantity ≥ 1
//! - A line's quantity never exceeds the snapshot availability at the time
//!   of the mutation that produced it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::snapshot::StockSnapshot;
use crate::types::{CustomerInfo, OrderLineRequest, Product};
use crate::validation::{validate_price, validate_quantity};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// Name and unit price are frozen at add time. If the catalog changes while
/// the sale is open, the cart keeps showing what the cashier saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,

    /// SKU of the bundle that first put this line in the cart, if any.
    pub origin_bundle: Option<String>,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_product(product: &Product, quantity: u32, origin_bundle: Option<&str>) -> Self {
        CartLine {
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            origin_bundle: origin_bundle.map(str::to_string),
            added_at: Utc::now(),
        }
    }

    /// True when the line was created by expanding a bundle.
    pub fn is_bundle(&self) -> bool {
        self.origin_bundle.is_some()
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The open sale: ordered lines plus optional customer details.
///
/// A cart is independent of the store context. Switching stores keeps it
/// intact, and checkout targets whatever store is active at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: CustomerInfo,
    created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            customer: CustomerInfo::default(),
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` of `product`, merging into an existing line.
    ///
    /// ## Returns
    /// The line's new quantity.
    ///
    /// ## Errors
    /// - `Validation` for a zero or oversized quantity, or a price outside
    ///   `0..=MAX_PRICE_CENTS`
    /// - `StockExceeded` when the line would pass the snapshot availability;
    ///   `remaining` is how many more could still be added
    /// - `QuantityTooLarge` / `CartTooLarge` for the cart limits
    pub fn add_line(
        &mut self,
        product: &Product,
        quantity: u32,
        snapshot: &StockSnapshot,
    ) -> CoreResult<u32> {
        self.check_addition(product, quantity, snapshot)?;
        if self.line(&product.sku).is_none() {
            self.check_new_lines(1)?;
        }
        Ok(self.merge_line(product, quantity, None))
    }

    /// Checks that `requested` more of `product` fits under every limit.
    pub(crate) fn check_addition(
        &self,
        product: &Product,
        requested: u32,
        snapshot: &StockSnapshot,
    ) -> CoreResult<()> {
        validate_quantity(requested)?;
        validate_price(product.price)?;

        let sku = product.sku.as_str();

        let current = self.quantity_of(sku);
        let available = snapshot.available(sku);
        let wanted = current.saturating_add(requested);

        if wanted > available {
            return Err(CoreError::StockExceeded {
                sku: sku.to_string(),
                requested,
                remaining: available.saturating_sub(current),
            });
        }

        if wanted > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: wanted,
                max: MAX_LINE_QUANTITY,
            });
        }

        Ok(())
    }

    /// Checks that `new_lines` more distinct lines fit.
    pub(crate) fn check_new_lines(&self, new_lines: usize) -> CoreResult<()> {
        if self.lines.len() + new_lines > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        Ok(())
    }

    /// Applies an addition that has already been checked.
    pub(crate) fn merge_line(
        &mut self,
        product: &Product,
        quantity: u32,
        origin_bundle: Option<&str>,
    ) -> u32 {
        if let Some(line) = self.lines.iter_mut().find(|l| l.sku == product.sku) {
            line.quantity += quantity;
            return line.quantity;
        }

        self.lines
            .push(CartLine::from_product(product, quantity, origin_bundle));
        quantity
    }

    /// Decrements a line by one, dropping it at zero.
    ///
    /// ## Returns
    /// The remaining quantity (0 when the line was removed).
    pub fn remove_one(&mut self, sku: &str) -> CoreResult<u32> {
        let index = self
            .lines
            .iter()
            .position(|l| l.sku == sku)
            .ok_or_else(|| CoreError::LineNotFound(sku.to_string()))?;

        if self.lines[index].quantity <= 1 {
            self.lines.remove(index);
            return Ok(0);
        }

        self.lines[index].quantity -= 1;
        Ok(self.lines[index].quantity)
    }

    /// Removes a whole line.
    pub fn remove_line(&mut self, sku: &str) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.sku == sku)
            .ok_or_else(|| CoreError::LineNotFound(sku.to_string()))?;
        Ok(self.lines.remove(index))
    }

    /// Empties lines and customer details.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer = CustomerInfo::default();
        self.created_at = Utc::now();
    }

    pub fn set_customer(&mut self, customer: CustomerInfo) {
        self.customer = customer;
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, sku: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.sku == sku)
    }

    /// Quantity of `sku` in the cart (0 if absent).
    pub fn quantity_of(&self, sku: &str) -> u32 {
        self.line(sku).map(|l| l.quantity).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ unit price × quantity, computed on demand.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The `{sku, quantity}` rows an order carries.
    pub fn to_order_lines(&self) -> Vec<OrderLineRequest> {
        self.lines
            .iter()
            .map(|l| OrderLineRequest {
                sku: l.sku.clone(),
                quantity: l.quantity,
            })
            .collect()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart totals summary for UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: u32,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
