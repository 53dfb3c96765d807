//! Store trait definitions for the checkout service's collaborators.
//!
//! The checkout workflow is written against these seams so the workflow can
//! be exercised without a database. The `PostgreSQL` implementations live in
//! [`crate::db`]; in-memory implementations live with the integration tests.
//!
//! All operations are async. Mutations on shared counters (stock, coupon
//! usage, point balances) are specified as conditional updates: the store,
//! not the caller, is responsible for never letting a counter cross its
//! bound under concurrent checkouts.

use std::future::Future;

use tamarind_core::{AccountId, CouponId, Email, OrderId, OrderStatus, ProductId};

use crate::db::RepositoryError;
use crate::models::{Account, Coupon, NewGuestAccount, NewOrder, Order, Product};

/// Outcome of an inventory deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// The product was found and its counters were adjusted.
    Adjusted,
    /// No such product; nothing was changed.
    ProductMissing,
}

/// Failure to deliver a notification. Logged by callers, never propagated.
#[derive(Debug, thiserror::Error)]
#[error("failed to send notification: {0}")]
pub struct NotificationError(pub String);

/// Account lookup and mutation.
pub trait AccountStore: Send + Sync {
    fn find_by_id(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Create a guest account from shipping details.
    fn create_guest(
        &self,
        guest: NewGuestAccount,
    ) -> impl Future<Output = Result<Account, RepositoryError>> + Send;

    /// Atomically apply `balance - spent + earned`, floored at zero.
    fn adjust_points(
        &self,
        id: AccountId,
        spent: i64,
        earned: i64,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Catalog lookup and inventory adjustment.
pub trait CatalogStore: Send + Sync {
    fn find_by_id(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Deduct `quantity` from a product's stock, floored at zero, and add it
    /// to the sold counter. When `variant` names an existing variant its own
    /// stock is deducted the same way; an unknown variant name is ignored.
    fn deduct_stock(
        &self,
        id: ProductId,
        variant: Option<&str>,
        quantity: u32,
    ) -> impl Future<Output = Result<StockAdjustment, RepositoryError>> + Send;
}

/// Discount-code lookup and redemption.
pub trait CouponStore: Send + Sync {
    /// Look up a coupon by its upper-cased code.
    fn find_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Coupon>, RepositoryError>> + Send;

    /// Advance the usage counter by one and record the order it was applied
    /// to, only if the counter is still below the cap. Returns whether the
    /// redemption won; `false` means another checkout exhausted the coupon
    /// first.
    fn redeem(
        &self,
        id: CouponId,
        order_id: OrderId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Order persistence.
pub trait OrderStore: Send + Sync {
    fn create(
        &self,
        order: NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Append a status transition to the order's history. The history is
    /// append-only; earlier entries are never rewritten.
    fn append_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Outbound confirmation messages. Best-effort: callers log failures and
/// continue.
pub trait ConfirmationSender: Send + Sync {
    fn send_order_confirmation(
        &self,
        to: &Email,
        order: &Order,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
