//! End-to-end checkout workflow tests against the in-memory stores.

use tamarind_checkout::models::DiscountKind;
use tamarind_checkout::pricing::DiscountOutcome;
use tamarind_checkout::services::{CheckoutError, PlaceOrder, RequestedItem, ShippingContact};
use tamarind_core::{Email, Money, ProductId};

use tamarind_integration_tests::TestHarness;

fn item(product_id: ProductId, price: i64, quantity: u32) -> RequestedItem {
    RequestedItem {
        product_id,
        name: "Item".to_string(),
        unit_price: Money::new(price),
        quantity,
        variant: None,
    }
}

fn request(items: Vec<RequestedItem>) -> PlaceOrder {
    PlaceOrder {
        items,
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

// =============================================================================
// Pricing
// =============================================================================

#[tokio::test]
async fn test_totals_reference_scenario() {
    // Two units at 100000 with a 30000 fee: tax is exactly 10% of the
    // subtotal and the total is the sum of charges.
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let placed = service
        .place_order(request(vec![item(product, 100_000, 2)]))
        .await
        .expect("checkout succeeds");

    let t = &placed.order.totals;
    assert_eq!(t.subtotal, Money::new(200_000));
    assert_eq!(t.tax, Money::new(20_000));
    assert_eq!(t.shipping_fee, Money::new(30_000));
    assert_eq!(t.total, Money::new(250_000));
    assert!(!placed.order.needs_review);
}

#[tokio::test]
async fn test_persisted_totals_survive_read_back() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let placed = service
        .place_order(request(vec![item(product, 100_000, 2)]))
        .await
        .expect("checkout succeeds");

    let read = service
        .order(placed.order.id)
        .await
        .expect("lookup succeeds")
        .expect("order exists");
    assert_eq!(read.totals, placed.order.totals);
    assert_eq!(read.lines, placed.order.lines);
}

// =============================================================================
// Purchaser resolution
// =============================================================================

#[tokio::test]
async fn test_guest_checkout_creates_account() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    assert!(harness.accounts.is_empty());

    let placed = service
        .place_order(request(vec![item(product, 100_000, 1)]))
        .await
        .expect("checkout succeeds");

    let email = Email::parse("an@example.com").expect("valid");
    let account = harness
        .accounts
        .get_by_email(&email)
        .expect("guest account created");
    assert_eq!(placed.order.account_id, account.id);
    assert_eq!(account.addresses.len(), 1);
    assert!(account.addresses[0].is_default);
}

#[tokio::test]
async fn test_repeat_guest_reuses_account() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let first = service
        .place_order(request(vec![item(product, 100_000, 1)]))
        .await
        .expect("first checkout");
    let second = service
        .place_order(request(vec![item(product, 100_000, 1)]))
        .await
        .expect("second checkout");

    assert_eq!(first.order.account_id, second.order.account_id);
    assert_eq!(harness.accounts.len(), 1);
}

#[tokio::test]
async fn test_guest_email_matching_is_case_insensitive() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();
    let seeded = harness.accounts.seed("an@example.com", 0);

    let mut input = request(vec![item(product, 100_000, 1)]);
    input.shipping.email = Some("An@Example.COM".to_string());

    let placed = service.place_order(input).await.expect("checkout succeeds");
    assert_eq!(placed.order.account_id, seeded);
    assert_eq!(harness.accounts.len(), 1);
}

#[tokio::test]
async fn test_guest_without_email_is_rejected() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 1)]);
    input.shipping.email = None;

    let err = service.place_order(input).await.expect_err("must fail");
    assert!(matches!(err, CheckoutError::Validation(_)));
    assert!(harness.accounts.is_empty());
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_stock_floors_at_zero_and_sold_advances() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 1);
    let service = harness.default_service();

    service
        .place_order(request(vec![item(product, 100_000, 3)]))
        .await
        .expect("oversell still checks out");

    let p = harness.catalog.get(product).expect("product exists");
    assert_eq!(p.stock(), 0);
    assert_eq!(p.sold, 3);
}

#[tokio::test]
async fn test_variant_deduction_updates_aggregate() {
    let harness = TestHarness::new();
    let product = harness
        .catalog
        .seed_variants("Tea", &[("250g", 100_000, 4), ("500g", 180_000, 6)]);
    let service = harness.default_service();

    let mut line = item(product, 100_000, 3);
    line.variant = Some("250g".to_string());
    service
        .place_order(request(vec![line]))
        .await
        .expect("checkout succeeds");

    let p = harness.catalog.get(product).expect("product exists");
    assert_eq!(p.variant_stock("250g"), Some(1));
    assert_eq!(p.variant_stock("500g"), Some(6));
    // Aggregate stock is derived from the variants.
    assert_eq!(p.stock(), 7);
}

#[tokio::test]
async fn test_unknown_product_is_skipped_silently() {
    let harness = TestHarness::new();
    let service = harness.default_service();

    let ghost = ProductId::new(999);
    let placed = service
        .place_order(request(vec![item(ghost, 100_000, 1)]))
        .await
        .expect("checkout still succeeds");

    // The order keeps the line exactly as requested.
    assert_eq!(placed.order.lines.len(), 1);
    assert_eq!(placed.order.lines[0].product_id, ghost);
    assert_eq!(placed.order.totals.subtotal, Money::new(100_000));
}

// =============================================================================
// Coupons
// =============================================================================

#[tokio::test]
async fn test_coupon_applies_and_records_order() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    harness
        .coupons
        .seed("WELCOME10", DiscountKind::Percent(10), 0, 5);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 2)]);
    // Lower-case on purpose: matching is case-insensitive.
    input.coupon_code = Some("welcome10".to_string());

    let placed = service.place_order(input).await.expect("checkout succeeds");

    assert_eq!(
        placed.discount,
        DiscountOutcome::Applied {
            code: "WELCOME10".to_string(),
            amount: Money::new(20_000),
        }
    );
    assert_eq!(placed.order.coupon_code.as_deref(), Some("WELCOME10"));
    assert_eq!(placed.order.totals.total, Money::new(230_000));

    let coupon = harness.coupons.get_by_code("WELCOME10").expect("exists");
    assert_eq!(coupon.used, 1);
    assert_eq!(coupon.order_ids, vec![placed.order.id]);
}

#[tokio::test]
async fn test_exhausted_coupon_soft_fails() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    harness
        .coupons
        .seed("WELCOME10", DiscountKind::Percent(10), 5, 5);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 2)]);
    input.coupon_code = Some("WELCOME10".to_string());

    let placed = service.place_order(input).await.expect("checkout succeeds");

    assert_eq!(
        placed.discount,
        DiscountOutcome::SkippedExhausted {
            code: "WELCOME10".to_string()
        }
    );
    assert_eq!(placed.order.coupon_code, None);
    assert_eq!(placed.order.totals.coupon_discount, Money::ZERO);
    assert_eq!(placed.order.totals.total, Money::new(250_000));

    // Counter and back-references untouched.
    let coupon = harness.coupons.get_by_code("WELCOME10").expect("exists");
    assert_eq!(coupon.used, 5);
    assert!(coupon.order_ids.is_empty());
}

#[tokio::test]
async fn test_unknown_coupon_soft_fails() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 2)]);
    input.coupon_code = Some("NOPE".to_string());

    let placed = service.place_order(input).await.expect("checkout succeeds");
    assert_eq!(
        placed.discount,
        DiscountOutcome::SkippedNotFound {
            code: "NOPE".to_string()
        }
    );
    assert_eq!(placed.order.totals.total, Money::new(250_000));
}

#[tokio::test]
async fn test_flat_coupon_discount() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    harness
        .coupons
        .seed("SAVE20K", DiscountKind::Flat(Money::new(20_000)), 0, 100);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 2)]);
    input.coupon_code = Some("SAVE20K".to_string());

    let placed = service.place_order(input).await.expect("checkout succeeds");
    assert_eq!(placed.order.totals.coupon_discount, Money::new(20_000));
    assert_eq!(placed.order.totals.total, Money::new(230_000));
}

// =============================================================================
// Loyalty points
// =============================================================================

#[tokio::test]
async fn test_points_redeemed_and_earned_in_one_balance_update() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let account_id = harness.accounts.seed("an@example.com", 40_000);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 2)]);
    input.account_id = Some(account_id);
    input.redeem_points = 10_000;

    let placed = service.place_order(input).await.expect("checkout succeeds");

    // total = 200000 + 20000 + 30000 - 10000 = 240000; earn = 24000
    assert_eq!(placed.order.totals.loyalty_discount, Money::new(10_000));
    assert_eq!(placed.order.totals.total, Money::new(240_000));
    assert_eq!(placed.order.points_spent, 10_000);
    assert_eq!(placed.order.points_earned, 24_000);

    let account = harness.accounts.get(account_id).expect("account exists");
    assert_eq!(account.points, 40_000 - 10_000 + 24_000);
}

#[tokio::test]
async fn test_redeeming_more_than_balance_is_rejected() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let account_id = harness.accounts.seed("an@example.com", 100);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 100_000, 2)]);
    input.account_id = Some(account_id);
    input.redeem_points = 101;

    let err = service.place_order(input).await.expect_err("must fail");
    assert!(matches!(err, CheckoutError::Validation(_)));

    // Nothing was persisted or mutated.
    let account = harness.accounts.get(account_id).expect("account exists");
    assert_eq!(account.points, 100);
    let p = harness.catalog.get(product).expect("product exists");
    assert_eq!(p.stock(), 50);
}

#[tokio::test]
async fn test_point_value_scales_both_directions() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let account_id = harness.accounts.seed("an@example.com", 50);
    let service = harness.service(tamarind_checkout::services::CheckoutSettings {
        shipping_fee: Money::new(30_000),
        point_value: 1_000,
    });

    let mut input = request(vec![item(product, 100_000, 2)]);
    input.account_id = Some(account_id);
    input.redeem_points = 10;

    let placed = service.place_order(input).await.expect("checkout succeeds");

    // 10 points at value 1000 discount 10000; total 240000 earns
    // floor(24000 / 1000) = 24 points.
    assert_eq!(placed.order.totals.loyalty_discount, Money::new(10_000));
    assert_eq!(placed.order.points_earned, 24);
}

// =============================================================================
// Clamping
// =============================================================================

#[tokio::test]
async fn test_overlarge_discount_clamps_total_and_flags_review() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Sticker", 1_000, 50);
    harness
        .coupons
        .seed("BIGOFF", DiscountKind::Flat(Money::new(500_000)), 0, 10);
    let service = harness.default_service();

    let mut input = request(vec![item(product, 1_000, 1)]);
    input.coupon_code = Some("BIGOFF".to_string());

    let placed = service.place_order(input).await.expect("checkout succeeds");
    assert_eq!(placed.order.totals.total, Money::ZERO);
    assert!(placed.order.needs_review);
    // Nothing owed, nothing earned.
    assert_eq!(placed.order.points_earned, 0);
}

// =============================================================================
// Confirmation mail
// =============================================================================

#[tokio::test]
async fn test_confirmation_is_sent_to_purchaser_email() {
    let harness = TestHarness::new();
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let placed = service
        .place_order(request(vec![item(product, 100_000, 1)]))
        .await
        .expect("checkout succeeds");

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].order_id, placed.order.id);
    assert_eq!(sent[0].to.as_str(), "an@example.com");
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_checkout() {
    use tamarind_integration_tests::RecordingMailer;

    let harness = TestHarness::with_mailer(RecordingMailer::failing());
    let product = harness.catalog.seed_flat("Soap", 100_000, 50);
    let service = harness.default_service();

    let placed = service
        .place_order(request(vec![item(product, 100_000, 1)]))
        .await
        .expect("checkout succeeds despite mail failure");

    assert!(harness.orders.get(placed.order.id).is_some());
}
