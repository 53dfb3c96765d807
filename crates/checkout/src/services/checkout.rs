//! The order placement workflow.
//!
//! One checkout is one bounded unit of work: resolve the purchaser, price
//! the cart, resolve the coupon, validate loyalty redemption, adjust
//! inventory, persist the order, then apply the side effects (coupon
//! counter, point balance, confirmation email). There is no in-process
//! synchronization across checkouts; every shared counter is advanced by a
//! conditional update inside the stores.

use rand::distr::{Alphanumeric, SampleString};
use tracing::{debug, info, instrument, warn};

use tamarind_core::{AccountId, Email, Money, OrderId, ProductId};

use crate::db::RepositoryError;
use crate::models::{
    Account, Address, NewGuestAccount, NewOrder, Order, OrderLine, OrderTotals, ShippingDetails,
};
use crate::pricing::{self, DiscountOutcome};
use crate::stores::{
    AccountStore, CatalogStore, ConfirmationSender, CouponStore, OrderStore, StockAdjustment,
};

/// Length of the opaque password placeholder given to guest accounts.
const GUEST_PASSWORD_LENGTH: usize = 32;

/// Errors from the checkout workflow.
///
/// Validation failures happen before any state mutation. Unresolved
/// products and coupons are deliberately not errors; they soft-fail (see
/// [`DiscountOutcome`] and the inventory skip policy).
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Malformed or missing required input; nothing was written.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage layer failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One requested line item.
#[derive(Debug, Clone)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub variant: Option<String>,
}

/// Shipping contact supplied with the checkout.
#[derive(Debug, Clone)]
pub struct ShippingContact {
    pub name: String,
    /// Required when no authenticated purchaser is supplied.
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
}

/// A checkout request.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub items: Vec<RequestedItem>,
    pub shipping: ShippingContact,
    pub payment_method: String,
    pub coupon_code: Option<String>,
    /// Loyalty points to redeem against the total.
    pub redeem_points: i64,
    /// Already-authenticated purchaser, if any.
    pub account_id: Option<AccountId>,
}

/// A successfully placed order plus how its coupon resolved.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub discount: DiscountOutcome,
}

/// Tunable checkout parameters.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    /// Fixed shipping fee charged on every order.
    pub shipping_fee: Money,
    /// Currency value of one loyalty point, used for both redemption and
    /// accrual.
    pub point_value: i64,
}

/// The order placement service.
///
/// Generic over its store seams so the workflow can run against
/// `PostgreSQL` in production and in-memory stores in tests.
pub struct CheckoutService<A, C, D, O, N> {
    accounts: A,
    catalog: C,
    coupons: D,
    orders: O,
    mailer: N,
    settings: CheckoutSettings,
}

impl<A, C, D, O, N> CheckoutService<A, C, D, O, N>
where
    A: AccountStore,
    C: CatalogStore,
    D: CouponStore,
    O: OrderStore,
    N: ConfirmationSender,
{
    /// Create a new checkout service.
    pub const fn new(
        accounts: A,
        catalog: C,
        coupons: D,
        orders: O,
        mailer: N,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            accounts,
            catalog,
            coupons,
            orders,
            mailer,
            settings,
        }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] for malformed input (empty
    /// cart, zero quantities, missing email without an authenticated
    /// purchaser, redeeming more points than held) and
    /// [`CheckoutError::Repository`] when the storage layer fails.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn place_order(&self, input: PlaceOrder) -> Result<PlacedOrder, CheckoutError> {
        validate(&input)?;

        let purchaser = self.resolve_purchaser(&input).await?;

        // Prices come from the request, not the catalog; the snapshot on
        // the order is what the shopper saw.
        let lines: Vec<OrderLine> = input.items.iter().map(to_order_line).collect();
        let subtotal = pricing::subtotal(&lines);

        let (discount, coupon) = self.resolve_discount(input.coupon_code.as_deref(), subtotal).await?;

        if input.redeem_points > purchaser.points {
            return Err(CheckoutError::Validation(format!(
                "cannot redeem {} points, balance is {}",
                input.redeem_points, purchaser.points
            )));
        }
        let loyalty_discount =
            pricing::redemption_value(input.redeem_points, self.settings.point_value);

        self.adjust_inventory(&lines).await?;

        let b = pricing::breakdown(
            subtotal,
            self.settings.shipping_fee,
            discount.amount(),
            loyalty_discount,
        );
        if b.clamped {
            warn!(
                account = %purchaser.id,
                "discounts exceed charges, clamping total to zero and flagging for review"
            );
        }

        let points_earned = pricing::points_earned(b.total, self.settings.point_value);

        let order = self
            .orders
            .create(NewOrder {
                account_id: purchaser.id,
                lines,
                shipping: ShippingDetails {
                    name: input.shipping.name.clone(),
                    email: purchaser.email.clone(),
                    phone: input.shipping.phone.clone(),
                    address: input.shipping.address.clone(),
                },
                payment_method: input.payment_method.clone(),
                totals: OrderTotals {
                    subtotal: b.subtotal,
                    tax: b.tax,
                    shipping_fee: b.shipping_fee,
                    coupon_discount: b.coupon_discount,
                    loyalty_discount: b.loyalty_discount,
                    total: b.total,
                },
                coupon_code: discount.applied_code().map(String::from),
                points_spent: input.redeem_points,
                points_earned,
                needs_review: b.clamped,
            })
            .await?;

        // The usage counter only advances once the order id exists, so the
        // back-reference is always valid. Losing the race here means the
        // order keeps its discount; that is logged, not rolled back.
        if let Some(coupon) = coupon {
            let won = self.coupons.redeem(coupon.id, order.id).await?;
            if !won {
                warn!(
                    order_id = %order.id,
                    coupon = %coupon.code,
                    "coupon exhausted between pricing and redemption; order keeps its discount"
                );
            }
        }

        self.accounts
            .adjust_points(purchaser.id, input.redeem_points, points_earned)
            .await?;

        // Best-effort: a failed confirmation never fails the checkout.
        if let Err(e) = self
            .mailer
            .send_order_confirmation(&order.shipping.email, &order)
            .await
        {
            warn!(order_id = %order.id, error = %e, "failed to send order confirmation");
        }

        info!(
            order_id = %order.id,
            account = %purchaser.id,
            total = %order.totals.total,
            "order placed"
        );

        Ok(PlacedOrder { order, discount })
    }

    /// Look up a placed order with its status history.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Repository`] when the storage layer fails.
    pub async fn order(&self, id: OrderId) -> Result<Option<Order>, CheckoutError> {
        Ok(self.orders.find_by_id(id).await?)
    }

    /// Resolve the purchaser: authenticated id, then shipping email, then
    /// guest account creation.
    async fn resolve_purchaser(&self, input: &PlaceOrder) -> Result<Account, CheckoutError> {
        if let Some(id) = input.account_id {
            return self
                .accounts
                .find_by_id(id)
                .await?
                .ok_or_else(|| CheckoutError::Validation(format!("unknown purchaser account {id}")));
        }

        let raw = input
            .shipping
            .email
            .as_deref()
            .ok_or_else(|| CheckoutError::Validation("shipping email is required".to_string()))?;
        let email = Email::parse(raw)
            .map_err(|e| CheckoutError::Validation(format!("invalid shipping email: {e}")))?;

        if let Some(account) = self.accounts.find_by_email(&email).await? {
            return Ok(account);
        }

        debug!(email = %email, "creating guest account");
        // Generated before the await: `ThreadRng` is not `Send` and must not
        // be held across a suspension point.
        let password_placeholder = Alphanumeric.sample_string(&mut rand::rng(), GUEST_PASSWORD_LENGTH);
        let account = self
            .accounts
            .create_guest(NewGuestAccount {
                email,
                name: input.shipping.name.clone(),
                address: Address {
                    name: input.shipping.name.clone(),
                    phone: input.shipping.phone.clone(),
                    line: input.shipping.address.clone(),
                    is_default: true,
                },
                password_placeholder,
            })
            .await?;

        Ok(account)
    }

    /// Resolve an optional coupon code into a discount outcome. Bad codes
    /// soft-fail; the coupon itself is returned for later redemption.
    async fn resolve_discount(
        &self,
        code: Option<&str>,
        subtotal: Money,
    ) -> Result<(DiscountOutcome, Option<crate::models::Coupon>), CheckoutError> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok((DiscountOutcome::NotRequested, None));
        };

        let code = code.to_uppercase();
        let coupon = self.coupons.find_by_code(&code).await?;
        let outcome = pricing::resolve_coupon(&code, coupon.as_ref(), subtotal);

        let redeemable = match &outcome {
            DiscountOutcome::Applied { .. } => coupon,
            _ => None,
        };

        Ok((outcome, redeemable))
    }

    /// Deduct stock for every line. Unknown products are skipped silently;
    /// the order still records the line as requested.
    async fn adjust_inventory(&self, lines: &[OrderLine]) -> Result<(), CheckoutError> {
        for line in lines {
            let adjusted = self
                .catalog
                .deduct_stock(line.product_id, line.variant.as_deref(), line.quantity)
                .await?;

            if adjusted == StockAdjustment::ProductMissing {
                debug!(product_id = %line.product_id, "product not in catalog, skipping inventory adjustment");
            }
        }
        Ok(())
    }
}

fn to_order_line(item: &RequestedItem) -> OrderLine {
    OrderLine {
        product_id: item.product_id,
        name: item.name.clone(),
        unit_price: item.unit_price,
        quantity: item.quantity,
        variant: item.variant.clone(),
    }
}

/// Reject malformed input before anything is written.
fn validate(input: &PlaceOrder) -> Result<(), CheckoutError> {
    if input.items.is_empty() {
        return Err(CheckoutError::Validation("cart is empty".to_string()));
    }
    if input.items.iter().any(|item| item.quantity == 0) {
        return Err(CheckoutError::Validation(
            "line item quantity must be at least 1".to_string(),
        ));
    }
    if input.shipping.name.trim().is_empty() {
        return Err(CheckoutError::Validation(
            "shipping name is required".to_string(),
        ));
    }
    if input.shipping.address.trim().is_empty() {
        return Err(CheckoutError::Validation(
            "shipping address is required".to_string(),
        ));
    }
    if input.account_id.is_none() && input.shipping.email.is_none() {
        return Err(CheckoutError::Validation(
            "shipping email is required for guest checkout".to_string(),
        ));
    }
    if input.redeem_points < 0 {
        return Err(CheckoutError::Validation(
            "redeemed points cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlaceOrder {
        PlaceOrder {
            items: vec![RequestedItem {
                product_id: ProductId::new(1),
                name: "Soap".to_string(),
                unit_price: Money::new(100_000),
                quantity: 2,
                variant: None,
            }],
            shipping: ShippingContact {
                name: "An Tran".to_string(),
                email: Some("an@example.com".to_string()),
                phone: "0900000000".to_string(),
                address: "12 Ly Thuong Kiet, Hanoi".to_string(),
            },
            payment_method: "cod".to_string(),
            coupon_code: None,
            redeem_points: 0,
            account_id: None,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_input() {
        assert!(validate(&request()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_cart() {
        let mut input = request();
        input.items.clear();
        assert!(matches!(
            validate(&input),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut input = request();
        if let Some(item) = input.items.first_mut() {
            item.quantity = 0;
        }
        assert!(matches!(
            validate(&input),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_requires_email_for_guests() {
        let mut input = request();
        input.shipping.email = None;
        assert!(matches!(
            validate(&input),
            Err(CheckoutError::Validation(_))
        ));

        // An authenticated purchaser does not need a shipping email.
        input.account_id = Some(AccountId::new(5));
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_points() {
        let mut input = request();
        input.redeem_points = -1;
        assert!(matches!(
            validate(&input),
            Err(CheckoutError::Validation(_))
        ));
    }
}
