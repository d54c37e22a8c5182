//! # Selection Set
//!
//! The operator's multi-select over catalog rows, keyed by SKU. Independent
//! of the cart; feeds the transfer and bundle builders.
//!
//! ```text
//! visible = [A, B, C]
//!
//! selection {}        ─ toggle_all ─►  {A, B, C}
//! selection {A, B, C} ─ toggle_all ─►  {}
//! selection {A}       ─ toggle_all ─►  {A, B, C}
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of selected SKUs.
///
/// Iteration is in SKU order so built requests are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet(BTreeSet<String>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or removes `sku`. Returns true if it is now selected.
    pub fn toggle(&mut self, sku: &str) -> bool {
        if self.0.remove(sku) {
            false
        } else {
            self.0.insert(sku.to_string());
            true
        }
    }

    /// Selects exactly `visible`, or clears if that is already the selection.
    pub fn toggle_all<I, S>(&mut self, visible: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let visible: BTreeSet<String> = visible.into_iter().map(Into::into).collect();
        if self.0 == visible {
            self.0.clear();
        } else {
            self.0 = visible;
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Deselects each of `skus`, leaving any other selection in place.
    pub fn remove_all<'a, I>(&mut self, skus: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for sku in skus {
            self.0.remove(sku);
        }
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.0.contains(sku)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        SelectionSet(iter.into_iter().map(Into::into).collect())
    }
}
