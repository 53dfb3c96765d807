//! Domain models for the checkout service.

pub mod account;
pub mod coupon;
pub mod order;
pub mod product;

pub use account::{Account, AccountRole, Address, NewGuestAccount};
pub use coupon::{Coupon, DiscountKind};
pub use order::{NewOrder, Order, OrderLine, OrderTotals, ShippingDetails};
pub use product::{Inventory, Product, Variant};
