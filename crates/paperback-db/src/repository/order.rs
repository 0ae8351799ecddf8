//! # Order Repository
//!
//! Atomic order creation with price snapshots, per-user order history,
//! and the status lifecycle (confirm / cancel).
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create(user, lines, draft)                          │
//! │                                                                         │
//! │  validate payload (non-empty, quantities 1..=999, sane fees)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                      │
//! │       │                                                                 │
//! │       ├── for each line: resolve book in the ACTIVE catalog            │
//! │       │        miss ──► error, transaction dropped, NOTHING persisted  │
//! │       │                                                                 │
//! │       ├── snapshot list_price_cents into each order item               │
//! │       │        (later catalog price changes never touch this order)    │
//! │       │                                                                 │
//! │       ├── INSERT orders (status = created, total = Σ qty × price)      │
//! │       ├── INSERT order_items                                           │
//! │       ▼                                                                 │
//! │  COMMIT ──► OrderView                                                   │
//! │                                                                         │
//! │  Lifecycle:  created ──confirm──► confirmed ──cancel──► cancelled      │
//! │  Guarded UPDATE (WHERE status = prior) so racing transitions cannot    │
//! │  both win.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use paperback_core::lifecycle::OrderAction;
use paperback_core::validation::validate_order_payload;
use paperback_core::{
    CoreError, Money, Order, OrderDraft, OrderItem, OrderLine, OrderStatus, OrderView,
};

/// Column list for loading [`Order`] rows.
const ORDER_COLUMNS: &str = "id, user_id, total_amount_cents, shipping_fee_cents, \
     discount_amount_cents, status, payment_method, shipping_method, customer_name, \
     customer_email, customer_phone, shipping_address, notes, item_count, \
     created_at, updated_at";

/// Repository for order operations.
///
/// Reads and cancellation are scoped to the owning user: another user's
/// order id behaves exactly like a nonexistent one. Confirmation is the
/// exception, it is driven by the payment/fulfilment process rather than
/// the buyer and is therefore unscoped.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order from an explicit payload of lines.
    ///
    /// The payload is deliberately decoupled from the user's cart: the
    /// caller says exactly what to order, and the cart (if any) is left
    /// untouched. Each line's unit price is snapshotted from the book's
    /// current list price inside the same transaction that writes the
    /// order, so the stored rows are internally consistent.
    ///
    /// ## Atomicity
    /// All-or-nothing: if ANY line references an unknown or inactive
    /// book, the whole order rolls back and nothing is persisted.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - empty payload, bad quantity, negative fees
    /// * `CoreError::BookNotFound` - a line's book is missing from the
    ///   active catalog
    pub async fn create(
        &self,
        user_id: &str,
        lines: &[OrderLine],
        draft: &OrderDraft,
    ) -> DbResult<OrderView> {
        validate_order_payload(lines, draft).map_err(CoreError::from)?;

        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Resolve and price every line inside the transaction. An early
        // return drops the transaction, which rolls it back.
        let mut items = Vec::with_capacity(lines.len());
        let mut total = Money::zero();

        for line in lines {
            let price_cents: i64 = sqlx::query_scalar(
                "SELECT list_price_cents FROM books WHERE id = ?1 AND is_active = 1",
            )
            .bind(&line.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::BookNotFound(line.book_id.clone()))?;

            let line_total = Money::from_cents(price_cents).multiply_quantity(line.quantity);
            total += line_total;

            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                book_id: line.book_id.clone(),
                quantity: line.quantity,
                price_cents,
                total_price_cents: line_total.cents(),
                created_at: now,
            });
        }

        let order = Order {
            id: order_id.clone(),
            user_id: user_id.to_string(),
            total_amount_cents: total.cents(),
            shipping_fee_cents: draft.shipping_fee_cents,
            discount_amount_cents: draft.discount_amount_cents,
            status: OrderStatus::Created,
            payment_method: draft.payment_method.clone(),
            shipping_method: draft.shipping_method.clone(),
            customer_name: draft.customer_name.clone(),
            customer_email: draft.customer_email.clone(),
            customer_phone: draft.customer_phone.clone(),
            shipping_address: draft.shipping_address.clone(),
            notes: draft.notes.clone(),
            item_count: items.len() as i64,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, total_amount_cents, shipping_fee_cents,
                discount_amount_cents, status, payment_method, shipping_method,
                customer_name, customer_email, customer_phone, shipping_address,
                notes, item_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.total_amount_cents)
        .bind(order.shipping_fee_cents)
        .bind(order.discount_amount_cents)
        .bind(order.status)
        .bind(&order.payment_method)
        .bind(&order.shipping_method)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.shipping_address)
        .bind(&order.notes)
        .bind(order.item_count)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, book_id, quantity, price_cents,
                    total_price_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.book_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .bind(item.total_price_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total_cents = order.total_amount_cents,
            item_count = order.item_count,
            "Created order"
        );

        Ok(OrderView { order, items })
    }

    /// Gets one of the user's orders with its items.
    ///
    /// ## Errors
    /// * `CoreError::OrderNotFound` - unknown id, or the order belongs
    ///   to a different user (deliberately indistinguishable)
    pub async fn get_for_user(&self, order_id: &str, user_id: &str) -> DbResult<OrderView> {
        let order = self.fetch_scoped(order_id, user_id).await?;
        let items = self.items_of(order_id).await?;
        Ok(OrderView { order, items })
    }

    /// Lists the user's orders, newest first, with their items.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<OrderView>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = ?1 \
             ORDER BY created_at DESC"
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.items_of(&order.id).await?;
            views.push(OrderView { order, items });
        }

        debug!(user_id = %user_id, count = views.len(), "Listed orders");
        Ok(views)
    }

    /// Cancels one of the user's orders.
    ///
    /// Only a CONFIRMED order may be cancelled: a freshly created order
    /// is still in the hands of the payment process, and a cancelled one
    /// is terminal.
    ///
    /// ## Errors
    /// * `CoreError::OrderNotFound` - unknown id or another user's order
    /// * `CoreError::InvalidTransition` - order is not in `confirmed`
    pub async fn cancel(&self, order_id: &str, user_id: &str) -> DbResult<Order> {
        let order = self.fetch_scoped(order_id, user_id).await?;
        self.transition(order, OrderAction::Cancel).await
    }

    /// Confirms an order (payment/fulfilment hook, not user-facing).
    ///
    /// Unscoped: the confirming process acts on the order id alone.
    ///
    /// ## Errors
    /// * `CoreError::OrderNotFound` - unknown id
    /// * `CoreError::InvalidTransition` - order is not in `created`
    pub async fn confirm(&self, order_id: &str) -> DbResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        self.transition(order, OrderAction::Confirm).await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Applies a lifecycle action with a status-guarded UPDATE.
    ///
    /// The WHERE clause re-checks the status the decision was made
    /// against, so two racing transitions cannot both win: the loser's
    /// UPDATE matches zero rows and surfaces as an invalid transition.
    async fn transition(&self, order: Order, action: OrderAction) -> DbResult<Order> {
        let next = order.status.apply(action)?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(&order.id)
        .bind(next)
        .bind(now)
        .bind(order.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(
                order_id = %order.id,
                from = %order.status,
                action = %action,
                "Lost transition race, order status changed underneath"
            );
            return Err(CoreError::InvalidTransition {
                from: order.status,
                action,
            }
            .into());
        }

        info!(order_id = %order.id, from = %order.status, to = %next, "Order transitioned");

        Ok(Order {
            status: next,
            updated_at: now,
            ..order
        })
    }

    /// Fetches an order scoped to its owner. A foreign or unknown id is
    /// the same `OrderNotFound` either way.
    async fn fetch_scoped(&self, order_id: &str, user_id: &str) -> DbResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2");

        sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    async fn items_of(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, book_id, quantity, price_cents,
                   total_price_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::testing::*;
    use paperback_core::{CoreError, OrderDraft, OrderLine, OrderStatus, ValidationError};

    fn line(book_id: &str, quantity: i64) -> OrderLine {
        OrderLine {
            book_id: book_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_snapshots_prices_and_totals() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;

        let view = db
            .orders()
            .create("user-1", &[line(&book, 3)], &OrderDraft::default())
            .await
            .unwrap();

        assert_eq!(view.order.status, OrderStatus::Created);
        assert_eq!(view.order.total_amount_cents, 2100);
        assert_eq!(view.order.item_count, 1);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].price_cents, 700);
        assert_eq!(view.items[0].total_price_cents, 2100);
    }

    #[tokio::test]
    async fn test_order_totals_survive_catalog_price_changes() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;

        let created = db
            .orders()
            .create("user-1", &[line(&book, 3)], &OrderDraft::default())
            .await
            .unwrap();

        set_list_price(&db, &book, 900).await;

        let reread = db
            .orders()
            .get_for_user(&created.order.id, "user-1")
            .await
            .unwrap();

        // The snapshot is frozen at order time.
        assert_eq!(reread.items[0].price_cents, 700);
        assert_eq!(reread.order.total_amount_cents, 2100);
    }

    #[tokio::test]
    async fn test_create_rolls_back_on_any_bad_line() {
        let db = test_db().await;
        let good = seed_book(&db, "Good", 1000).await;

        let err = db
            .orders()
            .create(
                "user-1",
                &[line(&good, 1), line("no-such-book", 1)],
                &OrderDraft::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BookNotFound(_))));

        // Nothing persisted, not even the good line.
        assert!(db.orders().list_for_user("user-1").await.unwrap().is_empty());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_invalid_payloads() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;
        let draft = OrderDraft::default();

        let err = db.orders().create("user-1", &[], &draft).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Empty { .. }))
        ));

        let err = db
            .orders()
            .create("user-1", &[line(&book, 0)], &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_carries_draft_fields() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;

        let draft = OrderDraft {
            payment_method: Some("cod".to_string()),
            customer_name: Some("Lena Osei".to_string()),
            shipping_fee_cents: 250,
            ..OrderDraft::default()
        };

        let view = db
            .orders()
            .create("user-1", &[line(&book, 1)], &draft)
            .await
            .unwrap();

        assert_eq!(view.order.payment_method.as_deref(), Some("cod"));
        assert_eq!(view.order.customer_name.as_deref(), Some("Lena Osei"));
        assert_eq!(view.order.shipping_fee_cents, 250);
    }

    #[tokio::test]
    async fn test_create_does_not_touch_the_cart() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;
        db.carts().add_item("user-1", &book, 2).await.unwrap();

        db.orders()
            .create("user-1", &[line(&book, 2)], &OrderDraft::default())
            .await
            .unwrap();

        // Ordering and carting are decoupled: the cart still holds its lines.
        let snapshot = db.carts().snapshot("user-1").await.unwrap();
        assert_eq!(snapshot.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_orders_are_scoped_to_their_owner() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;

        let view = db
            .orders()
            .create("user-a", &[line(&book, 1)], &OrderDraft::default())
            .await
            .unwrap();

        // Another user's id behaves exactly like a nonexistent one.
        let err = db
            .orders()
            .get_for_user(&view.order.id, "user-b")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(_))));

        let err = db.orders().cancel(&view.order.id, "user-b").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;
        let draft = OrderDraft::default();

        let first = db.orders().create("user-1", &[line(&book, 1)], &draft).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = db.orders().create("user-1", &[line(&book, 2)], &draft).await.unwrap();

        let listed = db.orders().list_for_user("user-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].order.id, second.order.id);
        assert_eq!(listed[1].order.id, first.order.id);
    }

    #[tokio::test]
    async fn test_cancel_requires_confirmed() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 700).await;

        let view = db
            .orders()
            .create("user-1", &[line(&book, 1)], &OrderDraft::default())
            .await
            .unwrap();
        let id = view.order.id.clone();

        // created → cancel: rejected
        let err = db.orders().cancel(&id, "user-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransition { .. })
        ));

        // created → confirm → cancel: allowed
        let confirmed = db.orders().confirm(&id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let cancelled = db.orders().cancel(&id, "user-1").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        // cancelled is terminal
        let err = db.orders().cancel(&id, "user-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransition { .. })
        ));
        let err = db.orders().confirm(&id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_confirm_unknown_order() {
        let db = test_db().await;
        let err = db.orders().confirm("no-such-order").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(_))));
    }
}
