//! # Checkout State Machine
//!
//! Drives a sale from item selection to a submitted order.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌───────────┐ to_verifying ┌───────────┐ begin_submit ┌────────────┐ │
//! │   │ Selecting │─────────────►│ Verifying │─────────────►│ Submitting │ │
//! │   └───────────┘◄─────────────└───────────┘              └─────┬──────┘ │
//! │        ▲  ▲          back                                     │        │
//! │        │  │                                    complete ┌─────┴─────┐  │
//! │        │  │       retry   ┌────────┐◄───────────── fail │           │  │
//! │        │  └───────────────│ Failed │                    ▼           │  │
//! │        │                  └────────┘             ┌───────────┐      │  │
//! │        └─────────── next sale ───────────────────│ Completed │◄─────┘  │
//! │                                                  └───────────┘         │
//! │                                                                         │
//! │   Completed: cart + customer cleared in the same step                  │
//! │   Failed:    cart untouched, server reason kept verbatim               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine never talks to the network. `begin_submit` hands back the
//! one `OrderRequest` to send; the caller reports the outcome with
//! `complete` or `fail`.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::context::StoreContext;
use crate::error::{CheckoutError, CheckoutPrecondition};
use crate::money::Money;
use crate::types::{CustomerInfo, OrderReceipt, OrderRequest, StoreId};

// =============================================================================
// Phase & State
// =============================================================================

/// Data-free view of the checkout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CheckoutPhase {
    Selecting,
    Verifying,
    Submitting,
    Completed,
    Failed,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CheckoutPhase::Selecting => "selecting",
            CheckoutPhase::Verifying => "verifying",
            CheckoutPhase::Submitting => "submitting",
            CheckoutPhase::Completed => "completed",
            CheckoutPhase::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Checkout state with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Selecting,
    Verifying,
    Submitting,
    Completed { receipt: OrderReceipt },
    Failed { reason: String },
}

impl CheckoutState {
    pub fn phase(&self) -> CheckoutPhase {
        match self {
            CheckoutState::Selecting => CheckoutPhase::Selecting,
            CheckoutState::Verifying => CheckoutPhase::Verifying,
            CheckoutState::Submitting => CheckoutPhase::Submitting,
            CheckoutState::Completed { .. } => CheckoutPhase::Completed,
            CheckoutState::Failed { .. } => CheckoutPhase::Failed,
        }
    }
}

// =============================================================================
// Verification View
// =============================================================================

/// Read-only copy of the cart shown on the verification screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VerificationView {
    pub store_id: StoreId,
    pub lines: Vec<CartLine>,
    pub customer: CustomerInfo,
    pub total: Money,
}

// =============================================================================
// Machine
// =============================================================================

/// The checkout state machine for one session.
#[derive(Debug, Clone, Default)]
pub struct CheckoutMachine {
    state: CheckoutState,
}

impl CheckoutMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.state.phase()
    }

    /// Every precondition for verification that does not hold.
    pub fn check_preconditions(cart: &Cart, context: StoreContext) -> Vec<CheckoutPrecondition> {
        let mut failed = Vec::new();
        if cart.is_empty() {
            failed.push(CheckoutPrecondition::EmptyCart);
        }
        if !cart.customer().has_name() {
            failed.push(CheckoutPrecondition::MissingCustomerName);
        }
        if context.store_id().is_none() {
            failed.push(CheckoutPrecondition::NoStoreSelected);
        }
        failed
    }

    /// Selecting → Verifying.
    ///
    /// On failure the machine stays in `Selecting` and the error lists
    /// every failed precondition.
    pub fn to_verifying(
        &mut self,
        cart: &Cart,
        context: StoreContext,
    ) -> Result<VerificationView, CheckoutError> {
        self.expect(CheckoutPhase::Selecting, "verify the order")?;
        let store_id = Self::ready_store(cart, context)?;

        self.state = CheckoutState::Verifying;
        Ok(VerificationView {
            store_id,
            lines: cart.lines().to_vec(),
            customer: cart.customer().clone(),
            total: cart.total(),
        })
    }

    /// Verifying → Selecting, without touching the cart.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.expect(CheckoutPhase::Verifying, "go back")?;
        self.state = CheckoutState::Selecting;
        Ok(())
    }

    /// Called before any cart edit.
    ///
    /// A finished checkout (completed or failed) returns to `Selecting`.
    /// Verifying and Submitting reject edits: the cart on screen is the one
    /// being confirmed.
    pub fn ensure_editable(&mut self) -> Result<(), CheckoutError> {
        match self.phase() {
            CheckoutPhase::Selecting => Ok(()),
            CheckoutPhase::Completed | CheckoutPhase::Failed => {
                self.state = CheckoutState::Selecting;
                Ok(())
            }
            CheckoutPhase::Submitting => Err(CheckoutError::SubmissionInFlight),
            from @ CheckoutPhase::Verifying => Err(CheckoutError::InvalidTransition {
                from,
                action: "edit the cart",
            }),
        }
    }

    /// Verifying → Submitting. Returns the single order to send.
    ///
    /// A second call while a submission runs is rejected, never queued.
    pub fn begin_submit(
        &mut self,
        cart: &Cart,
        context: StoreContext,
    ) -> Result<OrderRequest, CheckoutError> {
        if self.phase() == CheckoutPhase::Submitting {
            return Err(CheckoutError::SubmissionInFlight);
        }
        self.expect(CheckoutPhase::Verifying, "submit")?;
        let store_id = Self::ready_store(cart, context)?;

        self.state = CheckoutState::Submitting;
        Ok(OrderRequest {
            store_id,
            customer_name: cart.customer().name.clone(),
            customer_phone: cart.customer().phone.clone(),
            items: cart.to_order_lines(),
        })
    }

    /// Submitting → Completed. Clears cart and customer in the same step.
    pub fn complete(&mut self, receipt: OrderReceipt, cart: &mut Cart) -> Result<(), CheckoutError> {
        self.expect(CheckoutPhase::Submitting, "complete the order")?;
        cart.clear();
        self.state = CheckoutState::Completed { receipt };
        Ok(())
    }

    /// Submitting → Failed. The cart is left exactly as submitted.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CheckoutError> {
        self.expect(CheckoutPhase::Submitting, "record a failure")?;
        self.state = CheckoutState::Failed {
            reason: reason.into(),
        };
        Ok(())
    }

    /// Failed → Selecting.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        self.expect(CheckoutPhase::Failed, "retry")?;
        self.state = CheckoutState::Selecting;
        Ok(())
    }

    /// Back to `Selecting` from anywhere except an in-flight submission.
    pub fn reset(&mut self) -> Result<(), CheckoutError> {
        if self.phase() == CheckoutPhase::Submitting {
            return Err(CheckoutError::SubmissionInFlight);
        }
        self.state = CheckoutState::Selecting;
        Ok(())
    }

    fn expect(&self, phase: CheckoutPhase, action: &'static str) -> Result<(), CheckoutError> {
        if self.phase() == phase {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                from: self.phase(),
                action,
            })
        }
    }

    fn ready_store(cart: &Cart, context: StoreContext) -> Result<StoreId, CheckoutError> {
        let failed = Self::check_preconditions(cart, context);
        match context.store_id() {
            Some(id) if failed.is_empty() => Ok(id),
            _ => Err(CheckoutError::PreconditionsFailed(failed)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
