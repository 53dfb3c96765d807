//! Discount-code store backed by `PostgreSQL`.

use sqlx::PgPool;

use tamarind_core::{CouponId, Money, OrderId};

use super::RepositoryError;
use crate::models::{Coupon, DiscountKind};
use crate::stores::CouponStore;

/// `PostgreSQL` implementation of [`CouponStore`].
#[derive(Clone)]
pub struct PgCouponStore {
    pool: PgPool,
}

impl PgCouponStore {
    /// Create a new coupon store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: i64,
    code: String,
    kind: String,
    value: i64,
    used: i64,
    cap: i64,
    order_ids: Vec<i64>,
}

impl CouponRow {
    fn into_coupon(self) -> Result<Coupon, RepositoryError> {
        let kind = match self.kind.as_str() {
            "flat" => DiscountKind::Flat(Money::new(self.value)),
            "percent" => DiscountKind::Percent(self.value),
            other => {
                return Err(RepositoryError::DataCorruption(format!(
                    "invalid coupon kind: {other}"
                )));
            }
        };

        Ok(Coupon {
            id: CouponId::new(self.id),
            code: self.code,
            kind,
            used: self.used,
            cap: self.cap,
            order_ids: self.order_ids.into_iter().map(OrderId::new).collect(),
        })
    }
}

impl CouponStore for PgCouponStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        // Codes are stored upper-cased; callers upper-case before lookup.
        let row = sqlx::query_as::<_, CouponRow>(
            "SELECT id, code, kind, value, used, cap, order_ids FROM coupons WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    async fn redeem(&self, id: CouponId, order_id: OrderId) -> Result<bool, RepositoryError> {
        // Increment-if-below-cap: the WHERE clause makes two racing
        // checkouts serialize on the row, and the loser changes nothing.
        let result = sqlx::query(
            r"
            UPDATE coupons
            SET used = used + 1, order_ids = array_append(order_ids, $2)
            WHERE id = $1 AND used < cap
            ",
        )
        .bind(id.as_i64())
        .bind(order_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
