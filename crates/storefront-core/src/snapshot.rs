//! # Stock Snapshot
//!
//! Point-in-time availability for exactly one store context.
//!
//! A snapshot is never mutated after construction. When stock changes (a
//! sale, a transfer, a context switch) the caller loads a new one and swaps
//! it in whole; components hold it behind an `Arc` and only read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::context::StoreContext;
use crate::types::Product;

/// One row of the inventory view: a product and how many are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEntry {
    pub product: Product,
    pub available: u32,
}

impl StockEntry {
    pub fn new(product: Product, available: u32) -> Self {
        StockEntry { product, available }
    }
}

/// SKU → availability for one context.
#[derive(Debug, Clone)]
pub struct StockSnapshot {
    context: StoreContext,
    entries: HashMap<String, StockEntry>,
    loaded_at: DateTime<Utc>,
}

impl StockSnapshot {
    /// Builds a snapshot. A repeated SKU keeps its last row.
    pub fn new(context: StoreContext, entries: Vec<StockEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.product.sku.clone(), entry))
            .collect();

        StockSnapshot {
            context,
            entries,
            loaded_at: Utc::now(),
        }
    }

    /// A snapshot with no stock at all.
    pub fn empty(context: StoreContext) -> Self {
        StockSnapshot::new(context, Vec::new())
    }

    pub fn context(&self) -> StoreContext {
        self.context
    }

    /// Available quantity; zero for unknown SKUs.
    pub fn available(&self, sku: &str) -> u32 {
        self.entries.get(sku).map(|e| e.available).unwrap_or(0)
    }

    pub fn product(&self, sku: &str) -> Option<&Product> {
        self.entries.get(sku).map(|e| &e.product)
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.entries.contains_key(sku)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Products ordered by SKU, for stable catalog listings.
    pub fn products(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.entries.values().map(|e| &e.product).collect();
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        products
    }

    /// Entries ordered by SKU.
    pub fn entries(&self) -> Vec<&StockEntry> {
        let mut entries: Vec<&StockEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.product.sku.cmp(&b.product.sku));
        entries
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
