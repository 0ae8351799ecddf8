//! # paperback-core: Pure Business Logic for Paperback
//!
//! This crate is the **heart** of Paperback. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Paperback Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                External API Layer (not in this repo)            │   │
//! │  │    Routing ──► Auth ──► Request mapping ──► JSON responses      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ paperback-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ lifecycle │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │  Created  │  │   rules   │  │   │
//! │  │   │   Order   │  │  totals   │  │ Confirmed │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                paperback-db (Database Layer)                    │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Cart, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`lifecycle`] - Order status state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use paperback_core::Money` instead of
// `use paperback_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use lifecycle::OrderAction;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single cart or order payload
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;
