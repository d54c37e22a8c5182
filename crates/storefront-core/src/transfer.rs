//! # Transfer Request Builder
//!
//! Turns the selection set plus one operator-entered quantity into a stock
//! movement or a new bundle.
//!
//! ## Check Order
//! ```text
//! build_*()
//!   │
//!   ├── 1. context + capability   → InvalidContextOperation / NotPermitted
//!   ├── 2. selection non-empty    → EmptySelection
//!   ├── 3. quantity 1..=999       → Validation
//!   └── 4. payload
//! ```
//!
//! Every selected SKU gets the same quantity. Per-row quantities are not
//! supported.

use crate::context::{authorize, Capabilities, Operation, StoreContext};
use crate::error::{CoreError, CoreResult};
use crate::selection::SelectionSet;
use crate::types::{
    BundleComponent, BundleDraft, NewBundle, StoreId, TransferDirection, TransferItem,
    TransferRequest,
};
use crate::validation::validate_quantity;

/// Builds requests from a selection and a single quantity.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequestBuilder<'a> {
    selection: &'a SelectionSet,
    quantity: u32,
}

impl<'a> TransferRequestBuilder<'a> {
    pub fn new(selection: &'a SelectionSet, quantity: u32) -> Self {
        TransferRequestBuilder {
            selection,
            quantity,
        }
    }

    /// HQ → `target`. Only from HQ.
    pub fn build_allocate(
        &self,
        context: StoreContext,
        capabilities: Capabilities,
        target: StoreId,
    ) -> CoreResult<TransferRequest> {
        authorize(context, capabilities, Operation::Allocate)?;
        self.checked()?;
        Ok(self.transfer(TransferDirection::Allocate, target))
    }

    /// Active store → HQ. Only from a store context.
    pub fn build_return(
        &self,
        context: StoreContext,
        capabilities: Capabilities,
    ) -> CoreResult<TransferRequest> {
        authorize(context, capabilities, Operation::Return)?;
        let source = match context {
            StoreContext::Store(id) => id,
            // authorize() already rejected HQ
            StoreContext::Hq => {
                return Err(CoreError::InvalidContextOperation {
                    operation: Operation::Return,
                    context,
                })
            }
        };
        self.checked()?;
        Ok(self.transfer(TransferDirection::Return, source))
    }

    /// A new bundle made of the selected products, `quantity` of each.
    pub fn build_bundle(
        &self,
        context: StoreContext,
        capabilities: Capabilities,
        draft: &BundleDraft,
    ) -> CoreResult<NewBundle> {
        authorize(context, capabilities, Operation::CreateBundle)?;
        self.checked()?;

        let bundle = NewBundle {
            sku: draft.sku.trim().to_string(),
            name: draft.name.trim().to_string(),
            description: draft
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            price: draft.price,
            components: self
                .selection
                .iter()
                .map(|sku| BundleComponent::new(sku, self.quantity))
                .collect(),
        };
        bundle.validate()?;
        Ok(bundle)
    }

    fn checked(&self) -> CoreResult<()> {
        if self.selection.is_empty() {
            return Err(CoreError::EmptySelection);
        }
        validate_quantity(self.quantity)?;
        Ok(())
    }

    fn transfer(&self, direction: TransferDirection, store_id: StoreId) -> TransferRequest {
        TransferRequest {
            direction,
            store_id,
            items: self
                .selection
                .iter()
                .map(|sku| TransferItem {
                    sku: sku.to_string(),
                    quantity: self.quantity,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
