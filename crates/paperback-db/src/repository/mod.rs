//! # Repository Module
//!
//! Database repository implementations for Paperback.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  External API layer                                                    │
//! │       │                                                                 │
//! │       │  db.carts().add_item(user_id, book_id, 2)                      │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── get_or_create(&self, user_id)                                     │
//! │  ├── add_item(&self, user_id, book_id, qty)                            │
//! │  ├── update_item(&self, user_id, book_id, qty)                         │
//! │  └── snapshot(&self, user_id)                                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The transactional discipline lives next to the queries              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Read-only book/author/category/offer access
//! - [`CartRepository`](cart::CartRepository) - Per-user cart state and totals
//! - [`OrderRepository`](order::OrderRepository) - Atomic order creation and lifecycle

pub mod cart;
pub mod catalog;
pub mod order;

// =============================================================================
// Shared Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! Seed helpers for repository tests against an in-memory database.

    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};

    /// Fresh, migrated in-memory database.
    pub(crate) async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// Inserts an active book and returns its id.
    pub(crate) async fn seed_book(db: &Database, title: &str, list_price_cents: i64) -> String {
        seed_book_with(db, title, list_price_cents, true, false).await
    }

    /// Inserts a book with explicit active/featured flags and returns its id.
    pub(crate) async fn seed_book_with(
        db: &Database,
        title: &str,
        list_price_cents: i64,
        is_active: bool,
        is_featured: bool,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, list_price_cents, rating_average, quantity_sold,
                is_featured, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, 0, 0, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(title)
        .bind(list_price_cents)
        .bind(is_featured)
        .bind(is_active)
        .bind(now)
        .execute(db.pool())
        .await
        .expect("seed book");

        id
    }

    /// Changes a book's current list price (simulates a catalog feed update).
    pub(crate) async fn set_list_price(db: &Database, book_id: &str, list_price_cents: i64) {
        sqlx::query("UPDATE books SET list_price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(book_id)
            .bind(list_price_cents)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .expect("update list price");
    }

    /// Inserts a category and returns its id.
    pub(crate) async fn seed_category(db: &Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO categories (id, name, is_leaf) VALUES (?1, ?2, 1)")
            .bind(&id)
            .bind(name)
            .execute(db.pool())
            .await
            .expect("seed category");
        id
    }

    /// Links a book to a category.
    pub(crate) async fn link_category(db: &Database, book_id: &str, category_id: &str) {
        sqlx::query("INSERT INTO book_categories (book_id, category_id) VALUES (?1, ?2)")
            .bind(book_id)
            .bind(category_id)
            .execute(db.pool())
            .await
            .expect("link category");
    }

    /// Inserts a seller and returns its id.
    pub(crate) async fn seed_seller(db: &Database, name: &str, is_best_store: bool) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sellers (id, name, is_best_store) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(is_best_store)
            .execute(db.pool())
            .await
            .expect("seed seller");
        id
    }

    /// Inserts a seller offer on a book.
    pub(crate) async fn seed_offer(
        db: &Database,
        book_id: &str,
        seller_id: &str,
        sku: &str,
        price_cents: i64,
        is_current: bool,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO book_sellers (id, book_id, seller_id, sku, price_cents, is_current)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(book_id)
        .bind(seller_id)
        .bind(sku)
        .bind(price_cents)
        .bind(is_current)
        .execute(db.pool())
        .await
        .expect("seed offer");
        id
    }
}
