//! Database operations for the checkout `PostgreSQL`.
//!
//! # Tables
//!
//! - `accounts` - Purchaser accounts (address book as JSONB, point balance)
//! - `products` - Catalog items (`stock` is NULL when variants exist; the
//!   aggregate is always derived from `product_variants`)
//! - `product_variants` - Per-variant price and stock
//! - `coupons` - Discount codes with usage counter, cap, and applied orders
//! - `orders` / `order_lines` / `order_events` - Placed orders, their line
//!   snapshots, and the append-only status history
//!
//! All shared counters are mutated with single conditional statements
//! (`GREATEST(stock - qty, 0)`, `used + 1 ... WHERE used < cap`) so that
//! concurrent checkouts cannot oversell a product or over-redeem a coupon.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/checkout/migrations/` and run via:
//! ```bash
//! cargo run -p tamarind-cli -- migrate
//! ```

pub mod accounts;
pub mod coupons;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::PgAccountStore;
pub use coupons::PgCouponStore;
pub use orders::PgOrderStore;
pub use products::PgCatalogStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
