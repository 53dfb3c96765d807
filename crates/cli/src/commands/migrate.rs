//! Database migration command.
//!
//! Migrations live in `crates/checkout/migrations/` and are embedded into
//! the binary at compile time. They are never run automatically by the
//! checkout server; this command is the only migration path.

use tracing::info;

use tamarind_checkout::db;

/// Run checkout database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to checkout database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running checkout migrations...");
    sqlx::migrate!("../checkout/migrations").run(&pool).await?;

    info!("Checkout migrations complete!");
    Ok(())
}
