//! # Validation Module
//!
//! Input validation utilities for Paperback.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: External API layer                                           │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Request shape checks                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Quantity window (1..=999)                                         │
//! │  └── Order payload shape (non-empty, sane fees)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (one cart per user, one line per book)         │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Every check here runs BEFORE any write.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{OrderDraft, OrderLine};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0) — zero and negative are rejected, both for
///   additive adds and for absolute updates
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Example
/// ```rust
/// use paperback_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative money amount in cents (fees, discounts).
///
/// Zero is allowed: fees and discounts default to zero when omitted.
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use paperback_core::validation::validate_uuid;
///
/// assert!(validate_uuid("book_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("book_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Order Payload Validators
// =============================================================================

/// Validates an order payload before the builder touches the database.
///
/// ## Rules
/// - At least one line
/// - At most MAX_CART_ITEMS lines
/// - Every line has a valid quantity (1..=999)
/// - Shipping fee and discount are non-negative
///
/// Book-id resolution is NOT done here: existence is checked against
/// the catalog inside the order-creation transaction, so a miss rolls
/// the whole order back.
pub fn validate_order_payload(lines: &[OrderLine], draft: &OrderDraft) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    if lines.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    for line in lines {
        if line.book_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "book_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    validate_non_negative_cents("shipping_fee", draft.shipping_fee_cents)?;
    validate_non_negative_cents("discount_amount", draft.discount_amount_cents)?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
