//! Order model.
//!
//! An order is an immutable snapshot of what was purchased and what it
//! cost. The monetary breakdown is computed once at checkout and persisted;
//! reads return the stored values, nothing is recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tamarind_core::{AccountId, Email, Money, OrderId, OrderStatus, ProductId, StatusEntry};

/// One purchased line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Display name at time of purchase.
    pub name: String,
    /// Unit price at time of purchase.
    pub unit_price: Money,
    pub quantity: u32,
    /// Chosen variant name, if any.
    pub variant: Option<String>,
}

impl OrderLine {
    /// Line total (unit price times quantity).
    #[must_use]
    pub const fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Shipping details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
}

/// The persisted monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub coupon_discount: Money,
    pub loyalty_discount: Money,
    /// `subtotal + tax + shipping_fee - coupon_discount - loyalty_discount`,
    /// clamped at zero.
    pub total: Money,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub lines: Vec<OrderLine>,
    pub shipping: ShippingDetails,
    pub payment_method: String,
    pub totals: OrderTotals,
    /// Upper-cased coupon code, if one was applied.
    pub coupon_code: Option<String>,
    /// Loyalty points redeemed against this order.
    pub points_spent: i64,
    /// Loyalty points credited for this order.
    pub points_earned: i64,
    /// Set when discounts exceeded charges and the total was clamped to
    /// zero; such orders need manual review.
    pub needs_review: bool,
    pub status: OrderStatus,
    /// Append-only status history, oldest first.
    pub history: Vec<StatusEntry>,
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub lines: Vec<OrderLine>,
    pub shipping: ShippingDetails,
    pub payment_method: String,
    pub totals: OrderTotals,
    pub coupon_code: Option<String>,
    pub points_spent: i64,
    pub points_earned: i64,
    pub needs_review: bool,
}
