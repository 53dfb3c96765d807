//! Seed the database with sample catalog data.
//!
//! Inserts a handful of products (flat-stock and per-variant) and coupons
//! for local development. Idempotent: rows that already exist are left
//! alone.

use tracing::info;

use tamarind_checkout::db;

/// Seed sample products, variants, and coupons.
///
/// # Errors
///
/// Returns an error if the database URL is missing or inserts fail.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let products: &[(&str, i64, Option<i64>)] = &[
        ("Handmade Soap", 100_000, Some(50)),
        ("Beeswax Candle", 150_000, Some(30)),
        ("Green Tea", 100_000, None),
    ];

    for (name, price, stock) in products {
        let inserted = sqlx::query(
            r"
            INSERT INTO products (name, price, stock)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(price)
        .bind(stock)
        .execute(&pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!(product = name, "seeded product");
        }
    }

    // Variants for the per-variant product
    let variants: &[(&str, &str, i64, i64)] = &[
        ("Green Tea", "250g", 100_000, 20),
        ("Green Tea", "500g", 180_000, 10),
    ];

    for (product, variant, price, stock) in variants {
        sqlx::query(
            r"
            INSERT INTO product_variants (product_id, name, price, stock)
            SELECT p.id, $2, $3, $4
            FROM products p
            WHERE p.name = $1
            ON CONFLICT (product_id, name) DO NOTHING
            ",
        )
        .bind(product)
        .bind(variant)
        .bind(price)
        .bind(stock)
        .execute(&pool)
        .await?;
    }

    let coupons: &[(&str, &str, i64, i64)] = &[
        ("WELCOME10", "percent", 10, 1000),
        ("SAVE20K", "flat", 20_000, 100),
    ];

    for (code, kind, value, cap) in coupons {
        let inserted = sqlx::query(
            r"
            INSERT INTO coupons (code, kind, value, cap)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            ",
        )
        .bind(code)
        .bind(kind)
        .bind(value)
        .bind(cap)
        .execute(&pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!(coupon = code, "seeded coupon");
        }
    }

    info!("Seeding complete!");
    Ok(())
}
