//! # Domain Types
//!
//! Core domain types used throughout Paperback.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │      Cart       │   │      Order      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title          │   │  user_id (1:1)  │   │  user_id        │       │
//! │  │  list_price     │   │  CartItem[]     │   │  status         │       │
//! │  │  is_active      │   │  (mutable)      │   │  OrderItem[]    │       │
//! │  └─────────────────┘   └─────────────────┘   │  (immutable)    │       │
//! │                                               └─────────────────┘       │
//! │                                                                         │
//! │  Book is read-only catalog data. Cart is the one mutable per-user      │
//! │  aggregate. Order is a frozen snapshot: only status may change.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Shapes
//! Each operation returns a distinct, explicitly-typed view struct
//! (`CartSnapshot`, `OrderView`, `BookDetail`, ...) selected by the calling
//! code path. There is no runtime switching on operation names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Catalog: Book and Relations
// =============================================================================

/// A book in the catalog.
///
/// Read-only from this core's perspective: the cart/order flow never
/// mutates catalog rows, it only resolves and prices against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Long-form description.
    pub description: Option<String>,

    /// Short blurb for list views.
    pub short_description: Option<String>,

    /// Current list price in cents. This is the price carts compute
    /// against and the price orders snapshot at creation time.
    pub list_price_cents: i64,

    /// Pre-discount price in cents, if different from list price.
    pub original_price_cents: Option<i64>,

    /// Average review rating (0.0 - 5.0).
    pub rating_average: f64,

    /// Units sold to date.
    pub quantity_sold: i64,

    /// Pre-rendered "sold" text, if the feed supplied one.
    pub quantity_sold_text: Option<String>,

    /// Cover type (paperback, hardcover, ...).
    pub book_cover: Option<String>,

    /// Whether the book appears on the featured shelf.
    pub is_featured: bool,

    /// Whether the book is purchasable (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Returns the current list price as a Money type.
    #[inline]
    pub fn list_price(&self) -> Money {
        Money::from_cents(self.list_price_cents)
    }

    /// Returns the original (pre-discount) price as Money, if present.
    #[inline]
    pub fn original_price(&self) -> Option<Money> {
        self.original_price_cents.map(Money::from_cents)
    }

    /// Display text for units sold, falling back to a rendered count.
    pub fn quantity_sold_display(&self) -> String {
        match &self.quantity_sold_text {
            Some(text) => text.clone(),
            None => format!("Sold {}", self.quantity_sold),
        }
    }
}

/// A book author.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Author {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// A catalog category. `is_leaf` marks categories with no children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub is_leaf: bool,
}

/// An image attached to a book, in several resolutions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookImage {
    pub id: String,
    pub book_id: String,
    pub base_url: String,
    pub large_url: Option<String>,
    pub medium_url: Option<String>,
    pub small_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_gallery: bool,
    pub position: i64,
    pub label: Option<String>,
}

/// A typed attribute on a book (publisher, page count, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookAttribute {
    pub id: String,
    pub book_id: String,
    pub code: String,
    pub name: String,
    pub value: String,
}

/// A marketplace seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Seller {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub link: Option<String>,
    pub store_id: Option<String>,
    pub is_best_store: bool,
}

/// A seller's offer on a book.
///
/// ## Invariant
/// At most one offer per book has `is_current = true`. This is enforced
/// at write time by a partial unique index on `(book_id) WHERE
/// is_current = 1`; the read path simply filters on the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookOffer {
    pub id: String,
    pub book_id: String,
    pub seller_id: String,
    pub sku: String,
    pub price_cents: i64,
    pub is_current: bool,
}

impl BookOffer {
    /// Returns the offer price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// An offer joined with its seller, as shown to buyers.
///
/// Used both for the full offer list on a detail page and for the
/// single "current" (default displayed) offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    pub seller_id: String,
    pub sku: String,
    pub price_cents: i64,
    pub seller_name: String,
    pub seller_logo: Option<String>,
    pub seller_link: Option<String>,
    pub store_id: Option<String>,
    pub is_best_store: bool,
}

/// Full detail view of one book: the aggregate the detail endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub book: Book,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub images: Vec<BookImage>,
    pub attributes: Vec<BookAttribute>,
    pub offers: Vec<OfferView>,
    pub current_offer: Option<OfferView>,
}

// =============================================================================
// Cart
// =============================================================================

/// A per-user shopping cart.
///
/// Exactly one cart exists per user (created lazily on first access).
/// The cart row itself only carries timestamps; the contents live in
/// [`CartItem`] rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item in a cart.
///
/// ## Invariants
/// - Unique per `(cart_id, book_id)`: adding the same book again
///   increments quantity instead of creating a second row
/// - `quantity >= 1` always (zero/negative is rejected before any write)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub book_id: String,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined against the live catalog.
///
/// Unlike an order item, the price here is the book's CURRENT list
/// price: cart totals always reflect today's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Line total at the current catalog price.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// Derived cart totals.
///
/// `total_items` counts distinct lines, NOT the sum of quantities:
/// a cart with 2 copies of one book and 1 of another has 2 items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_amount_cents: i64,
    pub total_items: i64,
}

impl CartTotals {
    /// Computes totals over a set of cart lines.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use paperback_core::types::{CartLine, CartTotals};
    ///
    /// let line = |book: &str, price: i64, qty: i64| CartLine {
    ///     id: format!("line-{book}"),
    ///     book_id: book.to_string(),
    ///     title: book.to_string(),
    ///     unit_price_cents: price,
    ///     quantity: qty,
    ///     added_at: Utc::now(),
    /// };
    ///
    /// let totals = CartTotals::from_lines(&[line("a", 1000, 2), line("b", 500, 1)]);
    /// assert_eq!(totals.total_amount_cents, 2500);
    /// assert_eq!(totals.total_items, 2);
    /// ```
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let total: Money = lines.iter().map(CartLine::line_total).sum();
        CartTotals {
            total_amount_cents: total.cents(),
            total_items: lines.len() as i64,
        }
    }
}

/// The full cart view returned to the caller: cart + lines + totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// Transition rules live in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, awaiting confirmation (e.g., payment capture).
    Created,
    /// Confirmed by the external payment process.
    Confirmed,
    /// Cancelled by the owner. Terminal.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Created
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Created => "created",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// Immutable once created except for `status` and `updated_at`.
/// All monetary fields are frozen at creation time: later catalog price
/// changes never alter an existing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub total_amount_cents: i64,
    pub shipping_fee_cents: i64,
    pub discount_amount_cents: i64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    /// Number of line items (distinct books), not sum of quantities.
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A line item in an order.
///
/// ## Snapshot Pattern
/// `price_cents` is the book's list price AT ORDER TIME. It is copied
/// once and never updated, so order history stays stable when the
/// catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub book_id: String,
    pub quantity: i64,
    /// Unit price in cents at order time (frozen).
    pub price_cents: i64,
    /// quantity × price_cents, precomputed at order time.
    pub total_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the frozen line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// One requested line in an order payload: which book, how many.
///
/// The payload is supplied explicitly by the caller and is deliberately
/// decoupled from the live cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: String,
    pub quantity: i64,
}

/// Caller-supplied order fields that are accepted as given, not computed.
///
/// Shipping fee and discount are opaque inputs here (rate computation is
/// outside this core); they default to zero when the caller omits them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDraft {
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub shipping_fee_cents: i64,
    pub discount_amount_cents: i64,
}

/// The full order view returned to the caller: order + its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(book_id: &str, unit_price_cents: i64, quantity: i64) -> CartLine {
        CartLine {
            id: format!("line-{book_id}"),
            book_id: book_id.to_string(),
            title: format!("Book {book_id}"),
            unit_price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_totals_from_lines() {
        // [(bookA, $10, qty 2), (bookB, $5, qty 1)] → $25, 2 line items
        let lines = vec![line("a", 1000, 2), line("b", 500, 1)];
        let totals = CartTotals::from_lines(&lines);

        assert_eq!(totals.total_amount_cents, 2500);
        assert_eq!(totals.total_items, 2);
    }

    #[test]
    fn test_cart_totals_counts_lines_not_quantities() {
        let lines = vec![line("a", 100, 7)];
        let totals = CartTotals::from_lines(&lines);

        assert_eq!(totals.total_items, 1);
        assert_eq!(totals.total_amount_cents, 700);
    }

    #[test]
    fn test_cart_totals_empty() {
        let totals = CartTotals::from_lines(&[]);
        assert_eq!(totals.total_amount_cents, 0);
        assert_eq!(totals.total_items, 0);
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn test_order_status_display() {
        assert_eq!(OrderStatus::Created.to_string(), "created");
        assert_eq!(OrderStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_quantity_sold_display() {
        let mut book = Book {
            id: "b1".to_string(),
            title: "Test".to_string(),
            description: None,
            short_description: None,
            list_price_cents: 1000,
            original_price_cents: None,
            rating_average: 4.5,
            quantity_sold: 120,
            quantity_sold_text: None,
            book_cover: None,
            is_featured: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(book.quantity_sold_display(), "Sold 120");

        book.quantity_sold_text = Some("Bestseller - 120 sold".to_string());
        assert_eq!(book.quantity_sold_display(), "Bestseller - 120 sold");
    }

    #[test]
    fn test_order_draft_defaults_to_zero_fees() {
        let draft = OrderDraft::default();
        assert_eq!(draft.shipping_fee_cents, 0);
        assert_eq!(draft.discount_amount_cents, 0);
    }

    #[test]
    fn test_order_draft_deserializes_with_missing_fields() {
        let draft: OrderDraft = serde_json::from_str(r#"{"paymentMethod":"cod"}"#).unwrap();
        assert_eq!(draft.payment_method.as_deref(), Some("cod"));
        assert_eq!(draft.shipping_fee_cents, 0);
    }
}
