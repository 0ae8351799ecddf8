//! # Cart Repository
//!
//! Per-user cart state: lazy creation, additive adds, absolute updates,
//! removal, and the priced snapshot view.
//!
//! ## Cart Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Operations                                 │
//! │                                                                         │
//! │  snapshot(user)                                                         │
//! │       │                                                                 │
//! │       ├── get_or_create ──► INSERT .. ON CONFLICT(user_id) DO NOTHING  │
//! │       │                     then SELECT (race-safe, no duplicate cart) │
//! │       │                                                                 │
//! │       └── lines ──► JOIN books for CURRENT list price                  │
//! │                     totals derived in paperback-core, never stored     │
//! │                                                                         │
//! │  add_item(user, book, qty)      quantity ADDS to any existing line     │
//! │  update_item(user, book, qty)   quantity REPLACES the existing line    │
//! │  remove_item(user, book)        deletes the line                       │
//! │  clear(user)                    deletes every line, keeps the cart     │
//! │                                                                         │
//! │  The additive add is a single SQL upsert, so two concurrent adds of    │
//! │  the same book both land (no lost update).                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use paperback_core::validation::validate_quantity;
use paperback_core::{Cart, CartItem, CartLine, CartSnapshot, CartTotals, CoreError};

/// Repository for cart operations.
///
/// All methods take a `user_id` rather than a cart id: the cart is an
/// implementation detail the caller never has to manage. Identity of the
/// caller is established upstream.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Gets the user's cart, creating it if this is their first access.
    ///
    /// ## Concurrency
    /// Two concurrent first-accesses must not produce two carts. The
    /// insert is `ON CONFLICT(user_id) DO NOTHING`, so the loser of the
    /// race simply falls through to the read.
    pub async fn get_or_create(&self, user_id: &str) -> DbResult<Cart> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Adds a book to the user's cart (additive).
    ///
    /// If the book is already in the cart its quantity is INCREMENTED by
    /// `quantity`; otherwise a new line is created. The merge is a single
    /// SQL upsert, so concurrent adds of the same book cannot lose an
    /// update.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - quantity outside 1..=999
    /// * `CoreError::BookNotFound` - unknown or inactive book
    pub async fn add_item(&self, user_id: &str, book_id: &str, quantity: i64) -> DbResult<CartItem> {
        validate_quantity(quantity).map_err(CoreError::from)?;
        self.require_active_book(book_id).await?;

        let cart = self.get_or_create(user_id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (id, cart_id, book_id, quantity, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(cart_id, book_id)
                DO UPDATE SET quantity = quantity + excluded.quantity
            RETURNING id, cart_id, book_id, quantity, added_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&cart.id)
        .bind(book_id)
        .bind(quantity)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        self.touch_cart(&mut tx, &cart.id).await?;
        tx.commit().await?;

        debug!(
            user_id = %user_id,
            book_id = %book_id,
            quantity = item.quantity,
            "Added book to cart"
        );

        Ok(item)
    }

    /// Sets the quantity of a line that is already in the cart (absolute).
    ///
    /// Unlike [`add_item`](Self::add_item), the given quantity REPLACES
    /// the stored one. The line must already exist.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - quantity outside 1..=999 (zero does
    ///   NOT remove the line; removal is an explicit operation)
    /// * `CoreError::CartItemNotFound` - book not in the cart
    pub async fn update_item(
        &self,
        user_id: &str,
        book_id: &str,
        quantity: i64,
    ) -> DbResult<CartItem> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let cart = self.get_or_create(user_id).await?;

        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items SET quantity = ?3
            WHERE cart_id = ?1 AND book_id = ?2
            RETURNING id, cart_id, book_id, quantity, added_at
            "#,
        )
        .bind(&cart.id)
        .bind(book_id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::CartItemNotFound {
            book_id: book_id.to_string(),
        })?;

        self.touch_cart(&mut tx, &cart.id).await?;
        tx.commit().await?;

        debug!(
            user_id = %user_id,
            book_id = %book_id,
            quantity,
            "Updated cart line quantity"
        );

        Ok(item)
    }

    /// Removes a book from the user's cart.
    ///
    /// ## Errors
    /// * `CoreError::CartItemNotFound` - book not in the cart (removal
    ///   is NOT idempotent: a second remove of the same book reports the
    ///   miss to the caller)
    pub async fn remove_item(&self, user_id: &str, book_id: &str) -> DbResult<()> {
        let cart = self.get_or_create(user_id).await?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND book_id = ?2")
            .bind(&cart.id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CartItemNotFound {
                book_id: book_id.to_string(),
            }
            .into());
        }

        self.touch_cart(&mut tx, &cart.id).await?;
        tx.commit().await?;

        debug!(user_id = %user_id, book_id = %book_id, "Removed book from cart");
        Ok(())
    }

    /// Removes every line from the user's cart.
    ///
    /// The cart row itself survives. Clearing an already-empty cart is a
    /// no-op, not an error.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        let cart = self.get_or_create(user_id).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&self.pool)
            .await?;

        info!(
            user_id = %user_id,
            removed = result.rows_affected(),
            "Cleared cart"
        );

        Ok(())
    }

    /// Returns the full cart view: cart, priced lines, and totals.
    ///
    /// Lines are joined against the live catalog, so unit prices and the
    /// total always reflect the book's CURRENT list price. Totals are
    /// derived here on every read and never stored.
    pub async fn snapshot(&self, user_id: &str) -> DbResult<CartSnapshot> {
        let cart = self.get_or_create(user_id).await?;

        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT
                ci.id,
                ci.book_id,
                b.title,
                b.list_price_cents AS unit_price_cents,
                ci.quantity,
                ci.added_at
            FROM cart_items ci
            INNER JOIN books b ON b.id = ci.book_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.added_at
            "#,
        )
        .bind(&cart.id)
        .fetch_all(&self.pool)
        .await?;

        let totals = CartTotals::from_lines(&lines);

        Ok(CartSnapshot {
            cart,
            lines,
            totals,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Resolves a book id against the active catalog, or reports the miss.
    async fn require_active_book(&self, book_id: &str) -> DbResult<()> {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM books WHERE id = ?1 AND is_active = 1")
                .bind(book_id)
                .fetch_optional(&self.pool)
                .await?;

        match exists {
            Some(_) => Ok(()),
            None => Err(CoreError::BookNotFound(book_id.to_string()).into()),
        }
    }

    /// Bumps the cart's updated_at inside the caller's transaction.
    async fn touch_cart(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        cart_id: &str,
    ) -> DbResult<()> {
        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(cart_id)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::testing::*;
    use paperback_core::{CoreError, ValidationError};

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;

        let first = db.carts().get_or_create("user-1").await.unwrap();
        let second = db.carts().get_or_create("user-1").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.user_id, "user-1");
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let db = test_db().await;

        let a = db.carts().get_or_create("user-a").await.unwrap();
        let b = db.carts().get_or_create("user-b").await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_add_item_is_additive() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;

        let first = db.carts().add_item("user-1", &book, 2).await.unwrap();
        assert_eq!(first.quantity, 2);

        // Same book again: quantity merges into the existing line.
        let second = db.carts().add_item("user-1", &book, 3).await.unwrap();
        assert_eq!(second.quantity, 5);
        assert_eq!(second.id, first.id);

        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_item_rejects_unknown_and_inactive_books() {
        let db = test_db().await;
        let inactive = seed_book_with(&db, "Pulled", 1000, false, false).await;

        let err = db.carts().add_item("user-1", "no-such-book", 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BookNotFound(_))));

        let err = db.carts().add_item("user-1", &inactive, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BookNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_item_rejects_non_positive_quantity() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;

        for qty in [0, -1] {
            let err = db.carts().add_item("user-1", &book, qty).await.unwrap_err();
            assert!(matches!(
                err,
                DbError::Domain(CoreError::Validation(ValidationError::MustBePositive { .. }))
            ));
        }

        // Nothing was written.
        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert!(snapshot.lines.is_empty());
    }

    #[tokio::test]
    async fn test_update_item_is_absolute() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;

        db.carts().add_item("user-1", &book, 5).await.unwrap();
        let updated = db.carts().update_item("user-1", &book, 2).await.unwrap();

        assert_eq!(updated.quantity, 2);
    }

    #[tokio::test]
    async fn test_update_item_requires_existing_line() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;

        let err = db.carts().update_item("user-1", &book, 2).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::CartItemNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_item_rejects_zero_quantity() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;
        db.carts().add_item("user-1", &book, 3).await.unwrap();

        // Zero is a validation error, not an implicit removal.
        let err = db.carts().update_item("user-1", &book, 0).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert_eq!(snapshot.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_remove_item_reports_missing_line() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;

        db.carts().add_item("user-1", &book, 1).await.unwrap();
        db.carts().remove_item("user-1", &book).await.unwrap();

        // Second removal is a miss the caller hears about.
        let err = db.carts().remove_item("user-1", &book).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::CartItemNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_empties_cart_and_is_idempotent() {
        let db = test_db().await;
        let a = seed_book(&db, "A", 1000).await;
        let b = seed_book(&db, "B", 500).await;

        db.carts().add_item("user-1", &a, 2).await.unwrap();
        db.carts().add_item("user-1", &b, 1).await.unwrap();

        db.carts().clear("user-1").await.unwrap();
        db.carts().clear("user-1").await.unwrap(); // no-op, not an error

        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert!(snapshot.lines.is_empty());
        assert_eq!(snapshot.totals.total_amount_cents, 0);
    }

    #[tokio::test]
    async fn test_snapshot_totals_count_lines_not_quantities() {
        let db = test_db().await;
        let a = seed_book(&db, "A", 1000).await;
        let b = seed_book(&db, "B", 500).await;

        db.carts().add_item("user-1", &a, 2).await.unwrap();
        db.carts().add_item("user-1", &b, 1).await.unwrap();

        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        // $10×2 + $5×1 = $25; two LINES regardless of quantities.
        assert_eq!(snapshot.totals.total_amount_cents, 2500);
        assert_eq!(snapshot.totals.total_items, 2);
    }

    #[tokio::test]
    async fn test_snapshot_prices_track_the_live_catalog() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;
        db.carts().add_item("user-1", &book, 3).await.unwrap();

        set_list_price(&db, &book, 900).await;

        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert_eq!(snapshot.lines[0].unit_price_cents, 900);
        assert_eq!(snapshot.totals.total_amount_cents, 2700);
    }

    #[tokio::test]
    async fn test_concurrent_adds_both_land() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;
        let carts = db.carts();

        let (a, b) = tokio::join!(
            carts.add_item("user-1", &book, 1),
            carts.add_item("user-1", &book, 1),
        );
        a.unwrap();
        b.unwrap();

        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_carts_are_isolated_between_users() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1500).await;

        db.carts().add_item("user-a", &book, 2).await.unwrap();

        let other = db.carts().snapshot("user-b").await.unwrap();
        assert!(other.lines.is_empty());
    }
}
