//! # Seed Data Generator
//!
//! Populates the database with a development catalog of books.
//!
//! ## Usage
//! ```bash
//! # Generate 500 books (default)
//! cargo run -p paperback-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p paperback-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p paperback-db --bin seed -- --db ./data/paperback.db
//! ```
//!
//! ## Generated Data
//! - Books across fiction/non-fiction categories with realistic titles
//! - Authors linked to their books
//! - A handful of marketplace sellers
//! - One current offer per book (plus competing offers on some)
//! - List prices $4.99 - $49.99, a share marked featured
//!
//! All generation is deterministic from the book index, so repeated runs
//! against a fresh database produce the same catalog.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use paperback_db::{Database, DbConfig};

/// Categories with title stems for realistic book data.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Fiction",
        &[
            "The Silent Harbor",
            "A Winter in Marrakesh",
            "The Cartographer's Daughter",
            "Midnight at the Observatory",
            "The Last Ferry Home",
            "Letters from the Interior",
            "The Glass Orchard",
            "Salt and Smoke",
            "The Borrowed House",
            "Under a Paper Moon",
        ],
    ),
    (
        "Science Fiction",
        &[
            "Orbital Decay",
            "The Lighthouse at Proxima",
            "Signal to Noise",
            "The Terraform Accord",
            "Cold Equilibrium",
            "The Archive of Lost Ships",
            "Driftglass Station",
            "The Quiet War Below",
            "Halflight",
            "The Engine of Winters",
        ],
    ),
    (
        "Non-fiction",
        &[
            "Thinking in Systems",
            "The Craft of Asking",
            "A Field Guide to Attention",
            "How Cities Remember",
            "The Economics of Small Things",
            "Maps Before Borders",
            "On Keeping a Notebook",
            "The Shape of Work",
            "Slow Tools",
            "The Honest Kitchen",
        ],
    ),
    (
        "Children",
        &[
            "Marta and the Moon Bear",
            "The Umbrella Factory",
            "Ten Small Boats",
            "The Fox Who Counted Stars",
            "Grandpa's Pocket Garden",
            "The Littlest Lighthouse Keeper",
            "A Whale Named Tuesday",
            "The Paper Dragon Parade",
            "Socks for a Giraffe",
            "The Backyard Expedition",
        ],
    ),
    (
        "Technology",
        &[
            "Practical Data Pipelines",
            "The Pragmatic Reviewer",
            "Designing Quiet Software",
            "Notes on Distributed Time",
            "The Careful Refactor",
            "Storage for Humans",
            "Debugging by Hypothesis",
            "The Patient Compiler",
            "APIs That Age Well",
            "Small Services, Long Lives",
        ],
    ),
];

/// Author pool, assigned round-robin.
const AUTHORS: &[&str] = &[
    "Amara Diallo",
    "Jonas Lindqvist",
    "Priya Raman",
    "Tomás Herrera",
    "Yuki Tanaka",
    "Clara Moreau",
    "Dele Adeyemi",
    "Hana Novak",
    "Mikel Arrieta",
    "Ingrid Solberg",
];

/// Marketplace sellers. The first one is the "best store".
const SELLERS: &[&str] = &[
    "Paperback Official",
    "Riverside Books",
    "Northlight Trading",
    "Bindery Lane",
];

/// Cover types cycled across books.
const COVERS: &[&str] = &["paperback", "hardcover", "ebook"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./paperback_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Paperback Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of books to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./paperback_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Paperback Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Books:    {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing catalog
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Fixed reference rows first
    println!();
    println!("Creating authors, categories, and sellers...");

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for name in AUTHORS {
        let id = Uuid::new_v4().to_string();
        let slug = name.to_lowercase().replace(' ', "-");
        sqlx::query("INSERT INTO authors (id, name, slug) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(&slug)
            .execute(db.pool())
            .await?;
        author_ids.push(id);
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, _) in CATEGORIES {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO categories (id, name, is_leaf) VALUES (?1, ?2, 1)")
            .bind(&id)
            .bind(name)
            .execute(db.pool())
            .await?;
        category_ids.push(id);
    }

    let mut seller_ids = Vec::with_capacity(SELLERS.len());
    for (idx, name) in SELLERS.iter().enumerate() {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO sellers (id, name, store_id, is_best_store) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(name)
        .bind(format!("store-{}", idx + 1))
        .bind(idx == 0)
        .execute(db.pool())
        .await?;
        seller_ids.push(id);
    }

    // Generate books
    println!("Generating books...");

    let mut generated = 0usize;
    let start = std::time::Instant::now();

    'outer: loop {
        for (category_idx, (_, titles)) in CATEGORIES.iter().enumerate() {
            for (title_idx, title) in titles.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = generated;
                let edition = generated / (CATEGORIES.len() * titles.len()) + 1;
                let full_title = if edition > 1 {
                    format!("{} (Vol. {})", title, edition)
                } else {
                    title.to_string()
                };

                let book_id =
                    insert_book(&db, &full_title, category_idx, title_idx, seed).await?;

                // Relations: one author, one category
                sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES (?1, ?2)")
                    .bind(&book_id)
                    .bind(&author_ids[seed % author_ids.len()])
                    .execute(db.pool())
                    .await?;
                sqlx::query("INSERT INTO book_categories (book_id, category_id) VALUES (?1, ?2)")
                    .bind(&book_id)
                    .bind(&category_ids[category_idx])
                    .execute(db.pool())
                    .await?;

                insert_offers(&db, &book_id, &seller_ids, seed).await?;

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} books...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} books in {:?}", generated, elapsed);

    // Sanity checks through the repository API
    println!();
    println!("Verifying repositories...");
    let featured = db.catalog().list_featured(8).await?;
    println!("  Featured shelf: {} books", featured.len());

    let page = db.catalog().list_active(10, 0).await?;
    if let Some(first) = page.first() {
        let detail = db.catalog().get_detail(&first.id).await?;
        println!(
            "  Detail '{}': {} author(s), {} offer(s)",
            detail.book.title,
            detail.authors.len(),
            detail.offers.len()
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Inserts one book row with deterministic pseudo-random fields.
async fn insert_book(
    db: &Database,
    title: &str,
    category_idx: usize,
    title_idx: usize,
    seed: usize,
) -> Result<String, Box<dyn std::error::Error>> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    // Price: $4.99 - $49.99
    let list_price_cents = 499 + ((seed * 37) % 4501) as i64;

    // A third of books carry a pre-discount price ~25% higher
    let original_price_cents = if seed % 3 == 0 {
        Some(list_price_cents * 5 / 4)
    } else {
        None
    };

    // Rating 3.0 - 5.0, sold 0 - 5000
    let rating_average = 3.0 + ((seed * 13) % 21) as f64 / 10.0;
    let quantity_sold = ((seed * 211) % 5001) as i64;

    let is_featured = seed % 10 == 0;
    // A small slice of the catalog is deactivated, to exercise filters
    let is_active = seed % 25 != 24;

    sqlx::query(
        r#"
        INSERT INTO books (
            id, title, description, short_description, list_price_cents,
            original_price_cents, rating_average, quantity_sold,
            quantity_sold_text, book_cover, is_featured, is_active,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        "#,
    )
    .bind(&id)
    .bind(title)
    .bind(format!("Development copy of \"{}\".", title))
    .bind(format!("Shelf {}-{}", category_idx + 1, title_idx + 1))
    .bind(list_price_cents)
    .bind(original_price_cents)
    .bind(rating_average)
    .bind(quantity_sold)
    .bind(Option::<String>::None)
    .bind(COVERS[seed % COVERS.len()])
    .bind(is_featured)
    .bind(is_active)
    .bind(now)
    .execute(db.pool())
    .await?;

    Ok(id)
}

/// Inserts the current offer for a book, plus a competing offer on
/// every other book.
async fn insert_offers(
    db: &Database,
    book_id: &str,
    seller_ids: &[String],
    seed: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let current_seller = &seller_ids[seed % seller_ids.len()];
    let base_price = 499 + ((seed * 37) % 4501) as i64;

    sqlx::query(
        "INSERT INTO book_sellers (id, book_id, seller_id, sku, price_cents, is_current) \
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(book_id)
    .bind(current_seller)
    .bind(format!("PB-{:06}", seed))
    .bind(base_price)
    .execute(db.pool())
    .await?;

    if seed % 2 == 0 {
        let other_seller = &seller_ids[(seed + 1) % seller_ids.len()];
        sqlx::query(
            "INSERT INTO book_sellers (id, book_id, seller_id, sku, price_cents, is_current) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(book_id)
        .bind(other_seller)
        .bind(format!("PB-{:06}-B", seed))
        .bind(base_price + 150)
        .execute(db.pool())
        .await?;
    }

    Ok(())
}
