//! Order store backed by `PostgreSQL`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tamarind_core::{AccountId, Email, Money, OrderId, OrderStatus, ProductId, StatusEntry};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderLine, OrderTotals, ShippingDetails};
use crate::stores::OrderStore;

/// `PostgreSQL` implementation of [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    account_id: i64,
    shipping_name: String,
    shipping_email: String,
    shipping_phone: String,
    shipping_address: String,
    payment_method: String,
    subtotal: i64,
    tax: i64,
    shipping_fee: i64,
    coupon_discount: i64,
    loyalty_discount: i64,
    total: i64,
    coupon_code: Option<String>,
    points_spent: i64,
    points_earned: i64,
    needs_review: bool,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineRow {
    product_id: i64,
    name: String,
    unit_price: i64,
    quantity: i32,
    variant: Option<String>,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(
        self,
        lines: Vec<OrderLine>,
        history: Vec<StatusEntry>,
    ) -> Result<Order, RepositoryError> {
        let email = Email::parse(&self.shipping_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status = OrderStatus::from_str(&self.status).map_err(RepositoryError::DataCorruption)?;

        Ok(Order {
            id: OrderId::new(self.id),
            account_id: AccountId::new(self.account_id),
            lines,
            shipping: ShippingDetails {
                name: self.shipping_name,
                email,
                phone: self.shipping_phone,
                address: self.shipping_address,
            },
            payment_method: self.payment_method,
            totals: OrderTotals {
                subtotal: Money::new(self.subtotal),
                tax: Money::new(self.tax),
                shipping_fee: Money::new(self.shipping_fee),
                coupon_discount: Money::new(self.coupon_discount),
                loyalty_discount: Money::new(self.loyalty_discount),
                total: Money::new(self.total),
            },
            coupon_code: self.coupon_code,
            points_spent: self.points_spent,
            points_earned: self.points_earned,
            needs_review: self.needs_review,
            status,
            history,
            created_at: self.created_at,
        })
    }
}

fn line_from_row(row: LineRow) -> Result<OrderLine, RepositoryError> {
    let quantity = u32::try_from(row.quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative line quantity: {}", row.quantity))
    })?;

    Ok(OrderLine {
        product_id: ProductId::new(row.product_id),
        name: row.name,
        unit_price: Money::new(row.unit_price),
        quantity,
        variant: row.variant,
    })
}

fn event_from_row(row: EventRow) -> Result<StatusEntry, RepositoryError> {
    let status = OrderStatus::from_str(&row.status).map_err(RepositoryError::DataCorruption)?;
    Ok(StatusEntry {
        status,
        at: row.created_at,
    })
}

impl OrderStore for PgOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (
                account_id,
                shipping_name, shipping_email, shipping_phone, shipping_address,
                payment_method,
                subtotal, tax, shipping_fee, coupon_discount, loyalty_discount, total,
                coupon_code, points_spent, points_earned, needs_review, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'pending')
            RETURNING id, account_id,
                      shipping_name, shipping_email, shipping_phone, shipping_address,
                      payment_method,
                      subtotal, tax, shipping_fee, coupon_discount, loyalty_discount, total,
                      coupon_code, points_spent, points_earned, needs_review, status, created_at
            ",
        )
        .bind(order.account_id.as_i64())
        .bind(&order.shipping.name)
        .bind(order.shipping.email.as_str())
        .bind(&order.shipping.phone)
        .bind(&order.shipping.address)
        .bind(&order.payment_method)
        .bind(order.totals.subtotal.amount())
        .bind(order.totals.tax.amount())
        .bind(order.totals.shipping_fee.amount())
        .bind(order.totals.coupon_discount.amount())
        .bind(order.totals.loyalty_discount.amount())
        .bind(order.totals.total.amount())
        .bind(&order.coupon_code)
        .bind(order.points_spent)
        .bind(order.points_earned)
        .bind(order.needs_review)
        .fetch_one(&mut *tx)
        .await?;

        for line in &order.lines {
            sqlx::query(
                r"
                INSERT INTO order_lines (order_id, product_id, name, unit_price, quantity, variant)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(row.id)
            .bind(line.product_id.as_i64())
            .bind(&line.name)
            .bind(line.unit_price.amount())
            .bind(i64::from(line.quantity))
            .bind(&line.variant)
            .execute(&mut *tx)
            .await?;
        }

        // First history entry, timestamped with the order itself.
        sqlx::query(
            "INSERT INTO order_events (order_id, status, created_at) VALUES ($1, 'pending', $2)",
        )
        .bind(row.id)
        .bind(row.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let created_at = row.created_at;
        row.into_order(
            order.lines,
            vec![StatusEntry {
                status: OrderStatus::Pending,
                at: created_at,
            }],
        )
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, account_id,
                   shipping_name, shipping_email, shipping_phone, shipping_address,
                   payment_method,
                   subtotal, tax, shipping_fee, coupon_discount, loyalty_discount, total,
                   coupon_code, points_spent, points_earned, needs_review, status, created_at
            FROM orders WHERE id = $1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, LineRow>(
            r"
            SELECT product_id, name, unit_price, quantity, variant
            FROM order_lines WHERE order_id = $1 ORDER BY id
            ",
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(line_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let history = sqlx::query_as::<_, EventRow>(
            "SELECT status, created_at FROM order_events WHERE order_id = $1 ORDER BY id",
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(event_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        row.into_order(lines, history).map(Some)
    }

    async fn append_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(status.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("INSERT INTO order_events (order_id, status) VALUES ($1, $2)")
            .bind(id.as_i64())
            .bind(status.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
