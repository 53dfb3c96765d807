//! Tamarind Checkout - Order placement service.
//!
//! This crate implements the storefront's checkout workflow: purchaser
//! resolution (including guest checkout), pricing, coupon discounts,
//! loyalty-point redemption, inventory adjustment, order persistence, and
//! a best-effort confirmation email.
//!
//! # Architecture
//!
//! - Axum HTTP surface (`POST /orders`, `GET /orders/{id}`)
//! - [`services::checkout::CheckoutService`] orchestrates the workflow,
//!   generic over the store traits in [`stores`]
//! - [`db`] provides the `PostgreSQL` store implementations; all shared
//!   counters (stock, coupon usage, point balances) are updated with
//!   single conditional statements so concurrent checkouts cannot
//!   oversell or over-redeem
//! - `PostgreSQL` via sqlx, SMTP via lettre

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod services;
pub mod state;
pub mod stores;

pub use config::CheckoutConfig;
pub use error::{AppError, Result};
pub use state::AppState;
