//! Catalog store backed by `PostgreSQL`.
//!
//! The `products.stock` column is NULL for products that track stock per
//! variant; their aggregate stock is derived from `product_variants` at read
//! time and never stored, so the two cannot drift apart.

use sqlx::PgPool;

use tamarind_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::{Inventory, Product, Variant};
use crate::stores::{CatalogStore, StockAdjustment};

/// `PostgreSQL` implementation of [`CatalogStore`].
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new catalog store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: i64,
    stock: Option<i64>,
    sold: i64,
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    name: String,
    price: i64,
    stock: i64,
}

impl CatalogStore for PgCatalogStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price, stock, sold FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let variants = sqlx::query_as::<_, VariantRow>(
            "SELECT name, price, stock FROM product_variants WHERE product_id = $1 ORDER BY name",
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let product = if variants.is_empty() {
            Product {
                id: ProductId::new(row.id),
                name: row.name,
                price: Money::new(row.price),
                sold: row.sold,
                inventory: Inventory::Flat {
                    stock: row.stock.unwrap_or(0),
                },
            }
        } else {
            let variants: Vec<Variant> = variants
                .into_iter()
                .map(|v| Variant {
                    name: v.name,
                    price: Money::new(v.price),
                    stock: v.stock,
                })
                .collect();
            // Display price is the lowest variant price.
            let price = variants
                .iter()
                .map(|v| v.price)
                .min()
                .unwrap_or(Money::new(row.price));

            Product {
                id: ProductId::new(row.id),
                name: row.name,
                price,
                sold: row.sold,
                inventory: Inventory::PerVariant { variants },
            }
        };

        Ok(Some(product))
    }

    async fn deduct_stock(
        &self,
        id: ProductId,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<StockAdjustment, RepositoryError> {
        let quantity = i64::from(quantity);

        // Flat stock is clamped in SQL; for variant products the column is
        // NULL and stays NULL. Sold counts all units either way.
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = CASE WHEN stock IS NULL THEN NULL ELSE GREATEST(stock - $2, 0) END,
                sold = sold + $2,
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_i64())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(StockAdjustment::ProductMissing);
        }

        if let Some(variant) = variant {
            // An unknown variant name simply matches no row.
            sqlx::query(
                r"
                UPDATE product_variants
                SET stock = GREATEST(stock - $3, 0)
                WHERE product_id = $1 AND name = $2
                ",
            )
            .bind(id.as_i64())
            .bind(variant)
            .bind(quantity)
            .execute(&self.pool)
            .await?;
        }

        Ok(StockAdjustment::Adjusted)
    }
}
