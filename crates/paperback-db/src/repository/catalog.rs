//! # Catalog Repository
//!
//! Read-only database operations for books, authors, categories, and
//! seller offers.
//!
//! ## Role In The Core Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Catalog Store (read-only)                               │
//! │                                                                         │
//! │  Browse:    list_active / list_featured / similar / get_detail         │
//! │                                                                         │
//! │  Resolve:   require_active(book_id)                                    │
//! │             └── the Cart and Order flows call this to turn a           │
//! │                 caller-supplied book id into a priced catalog row;     │
//! │                 a miss is a caller-facing NotFound, never a fault      │
//! │                                                                         │
//! │  Nothing in this repository writes. Catalog ingestion (pricing         │
//! │  feeds, images, offers) happens outside this system.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use paperback_core::{
    Author, Book, BookAttribute, BookDetail, BookImage, Category, CoreError, OfferView,
};

/// Column list for loading [`Book`] rows.
const BOOK_COLUMNS: &str = "id, title, description, short_description, list_price_cents, \
     original_price_cents, rating_average, quantity_sold, quantity_sold_text, \
     book_cover, is_featured, is_active, created_at, updated_at";

/// Repository for read-only catalog access.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CatalogRepository::new(pool);
///
/// let shelf = repo.list_featured(8).await?;
/// let book = repo.require_active("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets an active book by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book exists and is active
    /// * `Ok(None)` - Unknown id, or the book was deactivated
    pub async fn get_active(&self, id: &str) -> DbResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1 AND is_active = 1");

        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Resolves a book id that MUST exist in the active catalog.
    ///
    /// This is the boundary call the cart and order flows use: a miss
    /// surfaces as `CoreError::BookNotFound` (caller-facing), never as
    /// a storage fault.
    pub async fn require_active(&self, id: &str) -> DbResult<Book> {
        self.get_active(id)
            .await?
            .ok_or_else(|| CoreError::BookNotFound(id.to_string()).into())
    }

    /// Lists active books, newest first.
    pub async fn list_active(&self, limit: i64, offset: i64) -> DbResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE is_active = 1 \
             ORDER BY created_at DESC \
             LIMIT ?1 OFFSET ?2"
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = books.len(), "Listed active books");
        Ok(books)
    }

    /// Lists the featured shelf (best rated first).
    pub async fn list_featured(&self, limit: i64) -> DbResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE is_active = 1 AND is_featured = 1 \
             ORDER BY rating_average DESC, quantity_sold DESC \
             LIMIT ?1"
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Lists books sharing at least one category with the given book,
    /// excluding the book itself.
    pub async fn similar(&self, book_id: &str, limit: i64) -> DbResult<Vec<Book>> {
        let sql = format!(
            "SELECT DISTINCT {cols} FROM books b \
             INNER JOIN book_categories bc ON bc.book_id = b.id \
             WHERE bc.category_id IN ( \
                 SELECT category_id FROM book_categories WHERE book_id = ?1 \
             ) \
             AND b.id != ?1 \
             AND b.is_active = 1 \
             ORDER BY b.rating_average DESC \
             LIMIT ?2",
            cols = BOOK_COLUMNS
                .split(", ")
                .map(|c| format!("b.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(book_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Gets the full detail view for one active book.
    ///
    /// Aggregates authors, categories, images, attributes, the complete
    /// offer list, and the single current offer.
    pub async fn get_detail(&self, book_id: &str) -> DbResult<BookDetail> {
        let book = self.require_active(book_id).await?;

        let authors = self.authors_of(book_id).await?;
        let categories = self.categories_of(book_id).await?;
        let images = self.images_of(book_id).await?;
        let attributes = self.attributes_of(book_id).await?;
        let offers = self.offers_of(book_id).await?;
        let current_offer = self.current_offer(book_id).await?;

        Ok(BookDetail {
            book,
            authors,
            categories,
            images,
            attributes,
            offers,
            current_offer,
        })
    }

    /// Gets the current (default displayed) offer for a book.
    ///
    /// The partial unique index guarantees at most one row matches, so
    /// the read path is a plain filter on the flag.
    pub async fn current_offer(&self, book_id: &str) -> DbResult<Option<OfferView>> {
        let offer = sqlx::query_as::<_, OfferView>(
            r#"
            SELECT
                bs.seller_id,
                bs.sku,
                bs.price_cents,
                s.name AS seller_name,
                s.logo AS seller_logo,
                s.link AS seller_link,
                s.store_id,
                s.is_best_store
            FROM book_sellers bs
            INNER JOIN sellers s ON s.id = bs.seller_id
            WHERE bs.book_id = ?1 AND bs.is_current = 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(offer)
    }

    /// Lists all authors (browse endpoint).
    pub async fn list_authors(&self) -> DbResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>("SELECT id, name, slug FROM authors ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(authors)
    }

    /// Lists all categories (browse endpoint).
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name, is_leaf FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    // -------------------------------------------------------------------------
    // Detail-view pieces
    // -------------------------------------------------------------------------

    async fn authors_of(&self, book_id: &str) -> DbResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT a.id, a.name, a.slug
            FROM authors a
            INNER JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = ?1
            ORDER BY a.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    async fn categories_of(&self, book_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.is_leaf
            FROM categories c
            INNER JOIN book_categories bc ON bc.category_id = c.id
            WHERE bc.book_id = ?1
            ORDER BY c.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn images_of(&self, book_id: &str) -> DbResult<Vec<BookImage>> {
        let images = sqlx::query_as::<_, BookImage>(
            r#"
            SELECT id, book_id, base_url, large_url, medium_url, small_url,
                   thumbnail_url, is_gallery, position, label
            FROM book_images
            WHERE book_id = ?1
            ORDER BY position
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn attributes_of(&self, book_id: &str) -> DbResult<Vec<BookAttribute>> {
        let attributes = sqlx::query_as::<_, BookAttribute>(
            "SELECT id, book_id, code, name, value FROM book_attributes WHERE book_id = ?1",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attributes)
    }

    async fn offers_of(&self, book_id: &str) -> DbResult<Vec<OfferView>> {
        let offers = sqlx::query_as::<_, OfferView>(
            r#"
            SELECT
                bs.seller_id,
                bs.sku,
                bs.price_cents,
                s.name AS seller_name,
                s.logo AS seller_logo,
                s.link AS seller_link,
                s.store_id,
                s.is_best_store
            FROM book_sellers bs
            INNER JOIN sellers s ON s.id = bs.seller_id
            WHERE bs.book_id = ?1
            ORDER BY bs.price_cents
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(offers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::testing::*;
    use paperback_core::CoreError;

    #[tokio::test]
    async fn test_get_active_filters_inactive_books() {
        let db = test_db().await;
        let active = seed_book(&db, "Visible", 1000).await;
        let inactive = seed_book_with(&db, "Hidden", 1000, false, false).await;

        assert!(db.catalog().get_active(&active).await.unwrap().is_some());
        assert!(db.catalog().get_active(&inactive).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_require_active_reports_book_not_found() {
        let db = test_db().await;

        let err = db.catalog().require_active("missing-id").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::BookNotFound(id)) if id == "missing-id"
        ));
    }

    #[tokio::test]
    async fn test_list_featured_only_returns_featured_active() {
        let db = test_db().await;
        seed_book(&db, "Plain", 1000).await;
        let featured = seed_book_with(&db, "Featured", 1500, true, true).await;
        seed_book_with(&db, "Featured But Inactive", 1500, false, true).await;

        let shelf = db.catalog().list_featured(8).await.unwrap();
        assert_eq!(shelf.len(), 1);
        assert_eq!(shelf[0].id, featured);
    }

    #[tokio::test]
    async fn test_similar_shares_category_and_excludes_self() {
        let db = test_db().await;
        let fiction = seed_category(&db, "Fiction").await;
        let poetry = seed_category(&db, "Poetry").await;

        let a = seed_book(&db, "A", 1000).await;
        let b = seed_book(&db, "B", 1200).await;
        let c = seed_book(&db, "C", 900).await;
        link_category(&db, &a, &fiction).await;
        link_category(&db, &b, &fiction).await;
        link_category(&db, &c, &poetry).await;

        let similar = db.catalog().similar(&a, 6).await.unwrap();
        let ids: Vec<_> = similar.iter().map(|book| book.id.as_str()).collect();
        assert_eq!(ids, vec![b.as_str()]);
    }

    #[tokio::test]
    async fn test_current_offer_filters_on_flag() {
        let db = test_db().await;
        let book = seed_book(&db, "Offered", 1000).await;
        let best = seed_seller(&db, "Best Books", true).await;
        let other = seed_seller(&db, "Other Books", false).await;
        seed_offer(&db, &book, &best, "SKU-1", 950, true).await;
        seed_offer(&db, &book, &other, "SKU-2", 990, false).await;

        let current = db.catalog().current_offer(&book).await.unwrap().unwrap();
        assert_eq!(current.sku, "SKU-1");
        assert_eq!(current.price_cents, 950);
        assert!(current.is_best_store);

        let detail = db.catalog().get_detail(&book).await.unwrap();
        assert_eq!(detail.offers.len(), 2);
        assert_eq!(detail.current_offer.unwrap().sku, "SKU-1");
    }

    #[tokio::test]
    async fn test_second_current_offer_violates_uniqueness() {
        let db = test_db().await;
        let book = seed_book(&db, "Offered", 1000).await;
        let s1 = seed_seller(&db, "One", false).await;
        let s2 = seed_seller(&db, "Two", false).await;
        seed_offer(&db, &book, &s1, "SKU-1", 950, true).await;

        // Second current offer for the same book must be rejected by the
        // partial unique index.
        let result = sqlx::query(
            "INSERT INTO book_sellers (id, book_id, seller_id, sku, price_cents, is_current) \
             VALUES ('dup', ?1, ?2, 'SKU-2', 990, 1)",
        )
        .bind(&book)
        .bind(&s2)
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }
}
