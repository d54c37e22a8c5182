//! # Bundle Resolver
//!
//! Expands a bundle into ordinary cart lines.
//!
//! ## Explosion Policy
//! ```text
//! Bundle BND-KIT "Study Kit"         Cart after add_bundle
//! ──────────────────────────         ─────────────────────────────────
//!   SKU-PEN  × 2           ────────► SKU-PEN   qty 2  (origin BND-KIT)
//!   SKU-NOTE × 1           ────────► SKU-NOTE  qty 1  (origin BND-KIT)
//!   SKU-GONE × 1  (not in snapshot)  skipped → PartialBundleResolution
//! ```
//!
//! Components become regular lines: the total is the sum of component
//! prices and the order payload carries component SKUs. The bundle's own
//! price is never charged.
//!
//! ## Atomicity
//! Every resolvable component is checked against the stock ceiling first
//! (repeated component SKUs are summed). If any check fails the whole
//! bundle is rejected and the cart is untouched.

use std::fmt;

use crate::cart::Cart;
use crate::error::CoreResult;
use crate::snapshot::StockSnapshot;
use crate::types::{Bundle, Product};

/// Outcome of adding a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResolution {
    pub bundle_sku: String,

    /// `(sku, quantity added)` per resolved component, in bundle order.
    pub added: Vec<(String, u32)>,

    /// Component SKUs absent from the snapshot.
    pub missing: Vec<String>,
}

impl BundleResolution {
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }

    /// The warning to surface when some components were skipped.
    pub fn warning(&self) -> Option<PartialBundleResolution> {
        if self.is_partial() {
            Some(PartialBundleResolution {
                bundle_sku: self.bundle_sku.clone(),
                missing_skus: self.missing.clone(),
            })
        } else {
            None
        }
    }
}

/// Warning value: a bundle was added without some of its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialBundleResolution {
    pub bundle_sku: String,
    pub missing_skus: Vec<String>,
}

impl fmt::Display for PartialBundleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bundle {} added without unavailable items: {}",
            self.bundle_sku,
            self.missing_skus.join(", ")
        )
    }
}

/// Adds every component of `bundle` to `cart`.
///
/// ## Errors
/// Any error from the line checks (`StockExceeded`, limits). The cart is
/// unchanged when an error is returned.
pub fn add_bundle(
    cart: &mut Cart,
    bundle: &Bundle,
    snapshot: &StockSnapshot,
) -> CoreResult<BundleResolution> {
    // Merge repeated component SKUs, keeping first-seen order
    let mut wanted: Vec<(&Product, u32)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for component in bundle.components() {
        match snapshot.product(&component.product_sku) {
            Some(product) => {
                if let Some(entry) = wanted.iter_mut().find(|(p, _)| p.sku == product.sku) {
                    entry.1 = entry.1.saturating_add(component.quantity);
                } else {
                    wanted.push((product, component.quantity));
                }
            }
            None => {
                if !missing.contains(&component.product_sku) {
                    missing.push(component.product_sku.clone());
                }
            }
        }
    }

    for (product, quantity) in &wanted {
        cart.check_addition(product, *quantity, snapshot)?;
    }
    let new_lines = wanted
        .iter()
        .filter(|(p, _)| cart.line(&p.sku).is_none())
        .count();
    cart.check_new_lines(new_lines)?;

    let added = wanted
        .into_iter()
        .map(|(product, quantity)| {
            cart.merge_line(product, quantity, Some(&bundle.sku));
            (product.sku.clone(), quantity)
        })
        .collect();

    Ok(BundleResolution {
        bundle_sku: bundle.sku.clone(),
        added,
        missing,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StoreContext;
    use crate::error::CoreError;
    use crate::money::Money;
    use crate::snapshot::StockEntry;
    use crate::types::{BundleComponent, StoreId};

    fn setup() -> (StockSnapshot, Product, Product) {
        let pen = Product::generic("SKU-PEN", "Gel Pen", Money::from_cents(250));
        let note = Product::generic("SKU-NOTE", "Notebook", Money::from_cents(499));
        let snapshot = StockSnapshot::new(
            StoreContext::Store(StoreId(3)),
            vec![StockEntry::new(pen.clone(), 4), StockEntry::new(note.clone(), 2)],
        );
        (snapshot, pen, note)
    }

    fn kit(components: Vec<BundleComponent>) -> Bundle {
        Bundle::new("BND-KIT", "Study Kit", Money::from_cents(800), components).unwrap()
    }

    #[test]
    fn test_bundle_explodes_into_lines() {
        let (snapshot, _, _) = setup();
        let bundle = kit(vec![
            BundleComponent::new("SKU-PEN", 2),
            BundleComponent::new("SKU-NOTE", 1),
        ]);
        let mut cart = Cart::new();

        let resolution = add_bundle(&mut cart, &bundle, &snapshot).unwrap();

        assert!(!resolution.is_partial());
        assert_eq!(cart.quantity_of("SKU-PEN"), 2);
        assert_eq!(cart.quantity_of("SKU-NOTE"), 1);
        assert_eq!(cart.line("SKU-PEN").unwrap().origin_bundle.as_deref(), Some("BND-KIT"));
        // Component prices, not the bundle price
        assert_eq!(cart.total().cents(), 2 * 250 + 499);
    }

    #[test]
    fn test_adding_bundle_twice_doubles_components() {
        let (snapshot, _, _) = setup();
        let bundle = kit(vec![
            BundleComponent::new("SKU-PEN", 2),
            BundleComponent::new("SKU-NOTE", 1),
        ]);
        let mut cart = Cart::new();

        add_bundle(&mut cart, &bundle, &snapshot).unwrap();
        add_bundle(&mut cart, &bundle, &snapshot).unwrap();

        assert_eq!(cart.quantity_of("SKU-PEN"), 4);
        assert_eq!(cart.quantity_of("SKU-NOTE"), 2);
    }

    #[test]
    fn test_missing_component_is_partial_not_error() {
        let (snapshot, _, _) = setup();
        let bundle = kit(vec![
            BundleComponent::new("SKU-PEN", 1),
            BundleComponent::new("SKU-GONE", 1),
        ]);
        let mut cart = Cart::new();

        let resolution = add_bundle(&mut cart, &bundle, &snapshot).unwrap();
        let warning = resolution.warning().unwrap();

        assert_eq!(warning.missing_skus, vec!["SKU-GONE".to_string()]);
        assert_eq!(
            warning.to_string(),
            "Bundle BND-KIT added without unavailable items: SKU-GONE"
        );
        assert_eq!(cart.quantity_of("SKU-PEN"), 1);
    }

    #[test]
    fn test_one_failing_component_rejects_whole_bundle() {
        let (snapshot, pen, _) = setup();
        let mut cart = Cart::new();
        cart.add_line(&pen, 1, &snapshot).unwrap();
        let before = cart.clone();

        // Pen fits (1 + 1 ≤ 4) but notebook does not (3 > 2)
        let bundle = kit(vec![
            BundleComponent::new("SKU-PEN", 1),
            BundleComponent::new("SKU-NOTE", 3),
        ]);

        let err = add_bundle(&mut cart, &bundle, &snapshot).unwrap_err();
        assert_eq!(
            err,
            CoreError::StockExceeded {
                sku: "SKU-NOTE".to_string(),
                requested: 3,
                remaining: 2,
            }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_negative_component_price_rejects_whole_bundle() {
        let (_, pen, _) = setup();
        let refund = Product::generic("SKU-REFUND", "Bad Row", Money::from_cents(-999));
        let snapshot = StockSnapshot::new(
            StoreContext::Store(StoreId(3)),
            vec![StockEntry::new(pen, 4), StockEntry::new(refund, 4)],
        );
        let bundle = kit(vec![
            BundleComponent::new("SKU-PEN", 1),
            BundleComponent::new("SKU-REFUND", 1),
        ]);
        let mut cart = Cart::new();

        assert!(matches!(
            add_bundle(&mut cart, &bundle, &snapshot),
            Err(CoreError::Validation(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_repeated_component_skus_are_summed() {
        let (snapshot, _, _) = setup();
        // 3 + 2 pens = 5 > 4 available, even though each row fits alone
        let bundle = kit(vec![
            BundleComponent::new("SKU-PEN", 3),
            BundleComponent::new("SKU-PEN", 2),
        ]);
        let mut cart = Cart::new();

        assert!(matches!(
            add_bundle(&mut cart, &bundle, &snapshot),
            Err(CoreError::StockExceeded { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_existing_line_keeps_its_origin() {
        let (snapshot, pen, _) = setup();
        let mut cart = Cart::new();
        cart.add_line(&pen, 1, &snapshot).unwrap();

        add_bundle(&mut cart, &kit(vec![BundleComponent::new("SKU-PEN", 1)]), &snapshot).unwrap();

        let line = cart.line("SKU-PEN").unwrap();
        assert_eq!(line.quantity, 2);
        assert!(!line.is_bundle());
    }
}
