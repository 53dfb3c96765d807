//! Catalog item model.
//!
//! Inventory is a tagged type: a product either tracks one flat stock count
//! or tracks stock per named variant. The aggregate stock of a variant
//! product is always derived from its variants, never stored independently,
//! so the two can never drift apart.

use serde::{Deserialize, Serialize};

use tamarind_core::{Money, ProductId};

/// A named sub-SKU of a product with its own price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub price: Money,
    /// Remaining stock. Never negative.
    pub stock: i64,
}

/// How a product's inventory is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inventory {
    /// One stock count for the whole product.
    Flat { stock: i64 },
    /// Stock tracked per variant; the aggregate is the sum.
    PerVariant { variants: Vec<Variant> },
}

/// A catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Display price. For variant products this is the lowest variant price.
    pub price: Money,
    /// Cumulative units sold across all checkouts.
    pub sold: i64,
    pub inventory: Inventory,
}

impl Product {
    /// Aggregate stock across the whole product.
    #[must_use]
    pub fn stock(&self) -> i64 {
        match &self.inventory {
            Inventory::Flat { stock } => *stock,
            Inventory::PerVariant { variants } => variants.iter().map(|v| v.stock).sum(),
        }
    }

    /// Stock of a named variant, if the product has one.
    #[must_use]
    pub fn variant_stock(&self, name: &str) -> Option<i64> {
        match &self.inventory {
            Inventory::Flat { .. } => None,
            Inventory::PerVariant { variants } => {
                variants.iter().find(|v| v.name == name).map(|v| v.stock)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(name: &str, price: i64, stock: i64) -> Variant {
        Variant {
            name: name.to_string(),
            price: Money::new(price),
            stock,
        }
    }

    #[test]
    fn test_flat_stock() {
        let product = Product {
            id: ProductId::new(1),
            name: "Candle".to_string(),
            price: Money::new(80_000),
            sold: 0,
            inventory: Inventory::Flat { stock: 12 },
        };
        assert_eq!(product.stock(), 12);
        assert_eq!(product.variant_stock("Large"), None);
    }

    #[test]
    fn test_aggregate_stock_is_derived() {
        let product = Product {
            id: ProductId::new(2),
            name: "Tea".to_string(),
            price: Money::new(50_000),
            sold: 3,
            inventory: Inventory::PerVariant {
                variants: vec![variant("100g", 50_000, 4), variant("250g", 110_000, 6)],
            },
        };
        assert_eq!(product.stock(), 10);
        assert_eq!(product.variant_stock("250g"), Some(6));
        assert_eq!(product.variant_stock("500g"), None);
    }
}
