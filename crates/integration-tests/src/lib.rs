//! Integration tests for Tamarind.
//!
//! The checkout workflow is generic over its store traits, so these tests
//! run the whole thing against the in-memory stores in this crate. No
//! database or SMTP relay is required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tamarind-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use tamarind_checkout::db::RepositoryError;
use tamarind_checkout::models::{
    Account, AccountRole, Coupon, DiscountKind, Inventory, NewGuestAccount, NewOrder, Order,
    Product, Variant,
};
use tamarind_checkout::services::{CheckoutService, CheckoutSettings};
use tamarind_checkout::stores::{
    AccountStore, CatalogStore, ConfirmationSender, CouponStore, NotificationError, OrderStore,
    StockAdjustment,
};
use tamarind_core::{
    AccountId, CouponId, Email, Money, OrderId, OrderStatus, ProductId, StatusEntry,
};

/// The checkout service wired to the in-memory stores.
pub type MemoryCheckoutService = CheckoutService<
    MemoryAccounts,
    MemoryCatalog,
    MemoryCoupons,
    MemoryOrders,
    RecordingMailer,
>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Default)]
struct AccountsState {
    next_id: i64,
    accounts: HashMap<AccountId, Account>,
}

/// In-memory [`AccountStore`].
#[derive(Clone, Default)]
pub struct MemoryAccounts {
    state: Arc<Mutex<AccountsState>>,
}

impl MemoryAccounts {
    /// Insert an account with an existing point balance and return its id.
    pub fn seed(&self, email: &str, points: i64) -> AccountId {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = AccountId::new(state.next_id);
        let now = Utc::now();
        state.accounts.insert(
            id,
            Account {
                id,
                email: Email::parse(email).expect("seed email must be valid"),
                name: "Seeded Shopper".to_string(),
                role: AccountRole::Shopper,
                points,
                addresses: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Snapshot an account.
    pub fn get(&self, id: AccountId) -> Option<Account> {
        lock(&self.state).accounts.get(&id).cloned()
    }

    /// Snapshot an account by email.
    pub fn get_by_email(&self, email: &Email) -> Option<Account> {
        lock(&self.state)
            .accounts
            .values()
            .find(|a| &a.email == email)
            .cloned()
    }

    /// Number of accounts held.
    pub fn len(&self) -> usize {
        lock(&self.state).accounts.len()
    }

    /// Whether no accounts are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountStore for MemoryAccounts {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        Ok(self.get_by_email(email))
    }

    async fn create_guest(&self, guest: NewGuestAccount) -> Result<Account, RepositoryError> {
        let mut state = lock(&self.state);
        if state.accounts.values().any(|a| a.email == guest.email) {
            return Err(RepositoryError::Conflict(format!(
                "account already exists: {}",
                guest.email
            )));
        }
        state.next_id += 1;
        let id = AccountId::new(state.next_id);
        let now = Utc::now();
        let account = Account {
            id,
            email: guest.email,
            name: guest.name,
            role: AccountRole::Shopper,
            points: 0,
            addresses: vec![guest.address],
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn adjust_points(
        &self,
        id: AccountId,
        spent: i64,
        earned: i64,
    ) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        let account = state.accounts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        account.points = (account.points - spent + earned).max(0);
        account.updated_at = Utc::now();
        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Default)]
struct CatalogState {
    next_id: i64,
    products: HashMap<ProductId, Product>,
}

/// In-memory [`CatalogStore`].
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    /// Insert a flat-stock product and return its id.
    pub fn seed_flat(&self, name: &str, price: i64, stock: i64) -> ProductId {
        self.insert(name, price, Inventory::Flat { stock })
    }

    /// Insert a per-variant product and return its id. Display price is the
    /// lowest variant price.
    pub fn seed_variants(&self, name: &str, variants: &[(&str, i64, i64)]) -> ProductId {
        let variants: Vec<Variant> = variants
            .iter()
            .map(|(name, price, stock)| Variant {
                name: (*name).to_string(),
                price: Money::new(*price),
                stock: *stock,
            })
            .collect();
        let price = variants
            .iter()
            .map(|v| v.price.amount())
            .min()
            .unwrap_or_default();
        self.insert(name, price, Inventory::PerVariant { variants })
    }

    fn insert(&self, name: &str, price: i64, inventory: Inventory) -> ProductId {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = ProductId::new(state.next_id);
        state.products.insert(
            id,
            Product {
                id,
                name: name.to_string(),
                price: Money::new(price),
                sold: 0,
                inventory,
            },
        );
        id
    }

    /// Snapshot a product.
    pub fn get(&self, id: ProductId) -> Option<Product> {
        lock(&self.state).products.get(&id).cloned()
    }
}

impl CatalogStore for MemoryCatalog {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn deduct_stock(
        &self,
        id: ProductId,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<StockAdjustment, RepositoryError> {
        let mut state = lock(&self.state);
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(StockAdjustment::ProductMissing);
        };

        let quantity = i64::from(quantity);
        match &mut product.inventory {
            Inventory::Flat { stock } => *stock = (*stock - quantity).max(0),
            Inventory::PerVariant { variants } => {
                if let Some(v) = variant.and_then(|name| variants.iter_mut().find(|v| v.name == name))
                {
                    v.stock = (v.stock - quantity).max(0);
                }
            }
        }
        product.sold += quantity;
        Ok(StockAdjustment::Adjusted)
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// In-memory [`CouponStore`].
#[derive(Clone, Default)]
pub struct MemoryCoupons {
    state: Arc<Mutex<HashMap<CouponId, Coupon>>>,
}

impl MemoryCoupons {
    /// Insert a coupon and return its id. The code is stored upper-cased.
    pub fn seed(&self, code: &str, kind: DiscountKind, used: i64, cap: i64) -> CouponId {
        let mut state = lock(&self.state);
        let id = CouponId::new(state.len() as i64 + 1);
        state.insert(
            id,
            Coupon {
                id,
                code: code.to_uppercase(),
                kind,
                used,
                cap,
                order_ids: Vec::new(),
            },
        );
        id
    }

    /// Snapshot a coupon by its code.
    pub fn get_by_code(&self, code: &str) -> Option<Coupon> {
        let code = code.to_uppercase();
        lock(&self.state).values().find(|c| c.code == code).cloned()
    }
}

impl CouponStore for MemoryCoupons {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self.get_by_code(code))
    }

    async fn redeem(&self, id: CouponId, order_id: OrderId) -> Result<bool, RepositoryError> {
        let mut state = lock(&self.state);
        let coupon = state.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if coupon.used >= coupon.cap {
            return Ok(false);
        }
        coupon.used += 1;
        coupon.order_ids.push(order_id);
        Ok(true)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Default)]
struct OrdersState {
    next_id: i64,
    orders: HashMap<OrderId, Order>,
}

/// In-memory [`OrderStore`].
#[derive(Clone, Default)]
pub struct MemoryOrders {
    state: Arc<Mutex<OrdersState>>,
}

impl MemoryOrders {
    /// Snapshot an order.
    pub fn get(&self, id: OrderId) -> Option<Order> {
        lock(&self.state).orders.get(&id).cloned()
    }
}

impl OrderStore for MemoryOrders {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = OrderId::new(state.next_id);
        let order = Order {
            id,
            account_id: order.account_id,
            lines: order.lines,
            shipping: order.shipping,
            payment_method: order.payment_method,
            totals: order.totals,
            coupon_code: order.coupon_code,
            points_spent: order.points_spent,
            points_earned: order.points_earned,
            needs_review: order.needs_review,
            status: OrderStatus::Pending,
            history: vec![StatusEntry::now(OrderStatus::Pending)],
            created_at: Utc::now(),
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn append_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        let order = state.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.status = status;
        order.history.push(StatusEntry::now(status));
        Ok(())
    }
}

// =============================================================================
// Mailer
// =============================================================================

/// A recorded confirmation delivery.
#[derive(Debug, Clone)]
pub struct SentConfirmation {
    pub to: Email,
    pub order_id: OrderId,
}

/// In-memory [`ConfirmationSender`] that records deliveries. Construct with
/// [`RecordingMailer::failing`] to simulate an unreachable relay.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentConfirmation>>>,
    fail: bool,
}

impl RecordingMailer {
    /// A mailer whose every delivery fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    /// Deliveries recorded so far.
    pub fn sent(&self) -> Vec<SentConfirmation> {
        lock(&self.sent).clone()
    }
}

impl ConfirmationSender for RecordingMailer {
    async fn send_order_confirmation(
        &self,
        to: &Email,
        order: &Order,
    ) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError("relay unreachable".to_string()));
        }
        lock(&self.sent).push(SentConfirmation {
            to: to.clone(),
            order_id: order.id,
        });
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// All in-memory stores plus a checkout service wired to them.
pub struct TestHarness {
    pub accounts: MemoryAccounts,
    pub catalog: MemoryCatalog,
    pub coupons: MemoryCoupons,
    pub orders: MemoryOrders,
    pub mailer: RecordingMailer,
}

impl TestHarness {
    /// Empty stores and a working mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    /// Empty stores with a caller-supplied mailer.
    #[must_use]
    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        Self {
            accounts: MemoryAccounts::default(),
            catalog: MemoryCatalog::default(),
            coupons: MemoryCoupons::default(),
            orders: MemoryOrders::default(),
            mailer,
        }
    }

    /// Build a checkout service over these stores.
    #[must_use]
    pub fn service(&self, settings: CheckoutSettings) -> MemoryCheckoutService {
        CheckoutService::new(
            self.accounts.clone(),
            self.catalog.clone(),
            self.coupons.clone(),
            self.orders.clone(),
            self.mailer.clone(),
            settings,
        )
    }

    /// A service with the default settings used across the tests: a 30000
    /// shipping fee and a point value of 1.
    #[must_use]
    pub fn default_service(&self) -> MemoryCheckoutService {
        self.service(CheckoutSettings {
            shipping_fee: Money::new(30_000),
            point_value: 1,
        })
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
