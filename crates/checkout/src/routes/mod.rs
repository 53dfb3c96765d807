//! HTTP route handlers.

pub mod orders;

use axum::Router;

use crate::state::AppState;

/// Build the router for all checkout routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(orders::routes())
}
