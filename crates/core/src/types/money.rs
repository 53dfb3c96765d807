//! Monetary amount type.
//!
//! All order arithmetic happens in whole currency units (the storefront
//! prices in a zero-decimal currency), so amounts are plain `i64` values.
//! Arithmetic saturates rather than wraps; percentages floor.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// A monetary amount in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Subtraction clamped at zero.
    ///
    /// Returns the clamped result and whether clamping occurred, so callers
    /// can flag orders whose discounts exceed their charges.
    #[must_use]
    pub const fn sub_clamped(self, rhs: Self) -> (Self, bool) {
        let raw = self.0.saturating_sub(rhs.0);
        if raw < 0 { (Self(0), true) } else { (Self(raw), false) }
    }

    /// Multiply a unit amount by a quantity, saturating on overflow.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// An integer percentage of this amount, floored.
    ///
    /// `Money::new(250_000).percent(10)` is `Money::new(25_000)`.
    #[must_use]
    pub const fn percent(self, pct: i64) -> Self {
        Self(self.0.saturating_mul(pct).div_euclid(100))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times() {
        assert_eq!(Money::new(100_000).times(2), Money::new(200_000));
        assert_eq!(Money::ZERO.times(100), Money::ZERO);
    }

    #[test]
    fn test_percent_floors() {
        assert_eq!(Money::new(250_000).percent(10), Money::new(25_000));
        assert_eq!(Money::new(99).percent(10), Money::new(9));
        assert_eq!(Money::new(5).percent(10), Money::ZERO);
    }

    #[test]
    fn test_sub_clamped() {
        let (result, clamped) = Money::new(100).sub_clamped(Money::new(30));
        assert_eq!(result, Money::new(70));
        assert!(!clamped);

        let (result, clamped) = Money::new(100).sub_clamped(Money::new(500));
        assert_eq!(result, Money::ZERO);
        assert!(clamped);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::new(1), Money::new(2), Money::new(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::new(6));
    }

    #[test]
    fn test_serde_transparent() {
        let money = Money::new(30_000);
        let json = serde_json::to_string(&money).expect("serialize");
        assert_eq!(json, "30000");
    }
}
