//! Pricing rules for checkout.
//!
//! Everything in this module is pure arithmetic over [`Money`]; the checkout
//! service feeds it resolved inputs and persists whatever comes out. Line
//! items are priced at the unit price supplied in the request, not re-read
//! from the catalog.

use serde::Serialize;

use tamarind_core::Money;

use crate::models::{Coupon, OrderLine};

/// Sales tax as a percentage of the subtotal.
pub const TAX_RATE_PERCENT: i64 = 10;

/// Loyalty points earned as a percentage of the final charged total.
pub const EARN_RATE_PERCENT: i64 = 10;

/// How a requested coupon code resolved.
///
/// A bad coupon never fails a checkout; it degrades to a zero discount with
/// an explicit reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DiscountOutcome {
    /// No coupon code was supplied.
    NotRequested,
    /// The coupon was found below its cap and applied.
    Applied { code: String, amount: Money },
    /// No coupon exists for the supplied code.
    SkippedNotFound { code: String },
    /// The coupon's usage counter already reached its cap.
    SkippedExhausted { code: String },
}

impl DiscountOutcome {
    /// The discount amount this outcome grants.
    #[must_use]
    pub const fn amount(&self) -> Money {
        match self {
            Self::Applied { amount, .. } => *amount,
            _ => Money::ZERO,
        }
    }

    /// The applied code, if the discount took effect.
    #[must_use]
    pub fn applied_code(&self) -> Option<&str> {
        match self {
            Self::Applied { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Sum of line totals.
#[must_use]
pub fn subtotal(lines: &[OrderLine]) -> Money {
    lines.iter().map(OrderLine::total).sum()
}

/// Resolve a looked-up coupon into a discount outcome against a subtotal.
#[must_use]
pub fn resolve_coupon(code: &str, coupon: Option<&Coupon>, subtotal: Money) -> DiscountOutcome {
    match coupon {
        None => DiscountOutcome::SkippedNotFound {
            code: code.to_string(),
        },
        Some(c) if c.is_exhausted() => DiscountOutcome::SkippedExhausted {
            code: c.code.clone(),
        },
        Some(c) => DiscountOutcome::Applied {
            code: c.code.clone(),
            amount: c.discount_for(subtotal),
        },
    }
}

/// Currency value of redeemed loyalty points.
///
/// One rate converts in both directions: a point is worth `point_value`
/// currency units when redeemed, and earned points are denominated in the
/// same unit.
#[must_use]
pub const fn redemption_value(points: i64, point_value: i64) -> Money {
    Money::new(points.saturating_mul(point_value))
}

/// Loyalty points earned from a final charged total.
#[must_use]
pub const fn points_earned(total: Money, point_value: i64) -> i64 {
    if point_value <= 0 {
        return 0;
    }
    total.percent(EARN_RATE_PERCENT).amount() / point_value
}

/// The computed breakdown of an order, plus whether the total had to be
/// clamped at zero (discounts exceeded charges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_fee: Money,
    pub coupon_discount: Money,
    pub loyalty_discount: Money,
    pub total: Money,
    pub clamped: bool,
}

/// Compute the full breakdown:
/// `total = subtotal + tax + shipping_fee - coupon - loyalty`, with tax at
/// [`TAX_RATE_PERCENT`] of the subtotal and the total clamped at zero.
#[must_use]
pub fn breakdown(
    subtotal: Money,
    shipping_fee: Money,
    coupon_discount: Money,
    loyalty_discount: Money,
) -> Breakdown {
    let tax = subtotal.percent(TAX_RATE_PERCENT);
    let charges = subtotal.saturating_add(tax).saturating_add(shipping_fee);
    let discounts = coupon_discount.saturating_add(loyalty_discount);
    let (total, clamped) = charges.sub_clamped(discounts);

    Breakdown {
        subtotal,
        tax,
        shipping_fee,
        coupon_discount,
        loyalty_discount,
        total,
        clamped,
    }
}
