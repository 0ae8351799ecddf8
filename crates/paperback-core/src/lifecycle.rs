//! # Order Lifecycle
//!
//! The order status state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Lifecycle                                    │
//! │                                                                         │
//! │              Confirm                  Cancel                            │
//! │   ┌─────────┐ (external  ┌───────────┐ (owner    ┌───────────┐         │
//! │   │ Created │──payment──►│ Confirmed │──only)───►│ Cancelled │ TERMINAL│
//! │   └─────────┘  capture)  └───────────┘           └───────────┘         │
//! │                                                                         │
//! │   Every other (state, action) pair is InvalidTransition.               │
//! │   Notably: Cancel is NOT allowed from Created — cancellation is only   │
//! │   permitted once an order has been confirmed.                          │
//! │                                                                         │
//! │   Confirm is never triggered from inside this core: it is the hook     │
//! │   the external payment-capture collaborator invokes.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why a Pure State Machine?
//! The data layer persists transitions with status-guarded UPDATEs, but
//! the RULES live here where they are trivially testable. An invalid
//! transition is a user error (`CoreError::InvalidTransition`), never a
//! fault.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::OrderStatus;

// =============================================================================
// Order Action
// =============================================================================

/// An action that may move an order between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Confirmation by the external payment process.
    Confirm,
    /// Cancellation by the order's owner.
    Cancel,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderAction::Confirm => "confirm",
            OrderAction::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Transitions
// =============================================================================

impl OrderStatus {
    /// Applies an action to this status, returning the next status.
    ///
    /// ## Transition Table
    /// | From      | Action  | To        |
    /// |-----------|---------|-----------|
    /// | Created   | Confirm | Confirmed |
    /// | Confirmed | Cancel  | Cancelled |
    /// | anything else       | Err(InvalidTransition) |
    ///
    /// ## Example
    /// ```rust
    /// use paperback_core::lifecycle::OrderAction;
    /// use paperback_core::types::OrderStatus;
    ///
    /// let next = OrderStatus::Confirmed.apply(OrderAction::Cancel).unwrap();
    /// assert_eq!(next, OrderStatus::Cancelled);
    ///
    /// // Cancel from Created is a user error, not a fault
    /// assert!(OrderStatus::Created.apply(OrderAction::Cancel).is_err());
    /// ```
    pub fn apply(self, action: OrderAction) -> Result<OrderStatus, CoreError> {
        match (self, action) {
            (OrderStatus::Created, OrderAction::Confirm) => Ok(OrderStatus::Confirmed),
            (OrderStatus::Confirmed, OrderAction::Cancel) => Ok(OrderStatus::Cancelled),
            (from, action) => Err(CoreError::InvalidTransition { from, action }),
        }
    }

    /// Checks whether an action is permitted from this status.
    #[inline]
    pub fn allows(self, action: OrderAction) -> bool {
        self.apply(action).is_ok()
    }

    /// Checks whether this status is terminal (no actions permitted).
    pub fn is_terminal(self) -> bool {
        !self.allows(OrderAction::Confirm) && !self.allows(OrderAction::Cancel)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
