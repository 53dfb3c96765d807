//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Resolve the checkout database URL from the environment.
pub fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    std::env::var("TAMARIND_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "TAMARIND_DATABASE_URL not set".into())
}
