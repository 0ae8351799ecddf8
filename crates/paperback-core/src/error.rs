//! # Error Types
//!
//! Domain-specific error types for paperback-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  paperback-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  paperback-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                        (absorbs CoreError via #[from])                 │
//! │                                                                         │
//! │  The external API layer maps kinds onto HTTP statuses:                 │
//! │    *NotFound          → 404                                            │
//! │    Validation         → 400                                            │
//! │    InvalidTransition  → 400 (user error, never a fault)                │
//! │    anything else      → 500 (logged, generic server error)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (book id, status, etc.)
//! 3. Errors are enum variants, never String
//! 4. Recoverable caller errors are distinct from faults

use thiserror::Error;

use crate::lifecycle::OrderAction;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic
/// failures. They are recoverable and caller-facing: the external API
/// layer translates them to specific response codes without retrying.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Book cannot be resolved against the active catalog.
    ///
    /// ## When This Occurs
    /// - Book id doesn't exist
    /// - Book was deactivated (soft delete)
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// No cart line exists for this book in the caller's cart.
    ///
    /// Idempotent failure: removing the same absent line twice reports
    /// this both times, with no side effect either time.
    #[error("Cart item not found for book: {book_id}")]
    CartItemNotFound { book_id: String },

    /// Order does not exist or is not visible to the caller.
    ///
    /// ## Ownership
    /// All order lookups are scoped to the acting user, so another
    /// user's order surfaces as this variant rather than leaking that
    /// the id exists.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Status change not permitted from the order's current status.
    ///
    /// ## When This Occurs
    /// - Cancelling an order that is still `created`
    /// - Cancelling an already cancelled order
    /// - Confirming an order twice
    #[error("Cannot {action} order in status {from}")]
    InvalidTransition {
        from: OrderStatus,
        action: OrderAction,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any write runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection is empty where at least one element is required.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::BookNotFound("b-123".to_string());
        assert_eq!(err.to_string(), "Book not found: b-123");

        let err = CoreError::InvalidTransition {
            from: OrderStatus::Created,
            action: OrderAction::Cancel,
        };
        assert_eq!(err.to_string(), "Cannot cancel order in status created");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "book_id".to_string(),
        };
        assert_eq!(err.to_string(), "book_id is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Empty {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
