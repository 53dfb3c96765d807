//! Shared application state for route handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::CheckoutConfig;
use crate::db::{PgAccountStore, PgCatalogStore, PgCouponStore, PgOrderStore};
use crate::services::{CheckoutService, CheckoutSettings, SmtpConfirmationSender};

/// The Postgres-backed checkout service used by the HTTP surface.
pub type PgCheckoutService = CheckoutService<
    PgAccountStore,
    PgCatalogStore,
    PgCouponStore,
    PgOrderStore,
    SmtpConfirmationSender,
>;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    pool: PgPool,
    checkout: PgCheckoutService,
}

impl AppState {
    /// Assemble the state from configuration and a connected pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be constructed from the
    /// configured relay host.
    pub fn new(
        config: CheckoutConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let mailer = SmtpConfirmationSender::new(config.email.as_ref())?;
        let checkout = CheckoutService::new(
            PgAccountStore::new(pool.clone()),
            PgCatalogStore::new(pool.clone()),
            PgCouponStore::new(pool.clone()),
            PgOrderStore::new(pool.clone()),
            mailer,
            CheckoutSettings {
                shipping_fee: config.shipping_fee,
                point_value: config.point_value,
            },
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                checkout,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn checkout(&self) -> &PgCheckoutService {
        &self.inner.checkout
    }
}
