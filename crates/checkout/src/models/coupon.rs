//! Discount code model.

use serde::{Deserialize, Serialize};

use tamarind_core::{CouponId, Money, OrderId};

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountKind {
    /// A fixed amount off the subtotal.
    Flat(Money),
    /// A percentage of the subtotal, floored.
    Percent(i64),
}

/// A redeemable discount code.
///
/// Codes are stored upper-cased and matched case-insensitively. The usage
/// counter is only ever advanced by a conditional update that refuses to go
/// past the cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Upper-cased code string.
    pub code: String,
    pub kind: DiscountKind,
    /// Times this coupon has been applied.
    pub used: i64,
    /// Maximum number of applications.
    pub cap: i64,
    /// Orders this coupon was applied to.
    pub order_ids: Vec<OrderId>,
}

impl Coupon {
    /// Whether the coupon has reached its usage cap.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.used >= self.cap
    }

    /// The discount this coupon grants against a subtotal.
    #[must_use]
    pub fn discount_for(&self, subtotal: Money) -> Money {
        match self.kind {
            DiscountKind::Flat(amount) => amount,
            DiscountKind::Percent(pct) => subtotal.percent(pct),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(kind: DiscountKind, used: i64, cap: i64) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "WELCOME10".to_string(),
            kind,
            used,
            cap,
            order_ids: Vec::new(),
        }
    }

    #[test]
    fn test_percent_discount() {
        let c = coupon(DiscountKind::Percent(10), 0, 100);
        assert_eq!(c.discount_for(Money::new(200_000)), Money::new(20_000));
    }

    #[test]
    fn test_flat_discount() {
        let c = coupon(DiscountKind::Flat(Money::new(15_000)), 0, 100);
        assert_eq!(c.discount_for(Money::new(200_000)), Money::new(15_000));
    }

    #[test]
    fn test_exhaustion() {
        assert!(!coupon(DiscountKind::Percent(5), 99, 100).is_exhausted());
        assert!(coupon(DiscountKind::Percent(5), 100, 100).is_exhausted());
    }
}
