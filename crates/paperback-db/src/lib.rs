//! # paperback-db: Database Layer for Paperback
//!
//! This crate provides database access for the Paperback system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Paperback Data Flow                               │
//! │                                                                         │
//! │  External API layer (add item, checkout, cancel, ...)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   paperback-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CartRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ OrderRepo     │    │              │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                     SQLite Database (WAL mode)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, cart, order)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paperback_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/paperback.db");
//! let db = Database::new(config).await?;
//!
//! // Cart flow
//! let item = db.carts().add_item("user-1", "book-1", 2).await?;
//! let snapshot = db.carts().snapshot("user-1").await?;
//!
//! // Checkout flow
//! let order = db.orders().create("user-1", &lines, &draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::order::OrderRepository;
