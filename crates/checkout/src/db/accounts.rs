//! Account store backed by `PostgreSQL`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tamarind_core::{AccountId, Email};

use super::RepositoryError;
use crate::models::{Account, AccountRole, Address, NewGuestAccount};
use crate::stores::AccountStore;

/// `PostgreSQL` implementation of [`AccountStore`].
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new account store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    points: i64,
    addresses: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = AccountRole::from_str(&self.role).map_err(RepositoryError::DataCorruption)?;
        let addresses: Vec<Address> = serde_json::from_value(self.addresses).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid address book in database: {e}"))
        })?;

        Ok(Account {
            id: AccountId::new(self.id),
            email,
            name: self.name,
            role,
            points: self.points,
            addresses,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ACCOUNT: &str =
    "SELECT id, email, name, role, points, addresses, created_at, updated_at FROM accounts";

impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNT} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn create_guest(&self, guest: NewGuestAccount) -> Result<Account, RepositoryError> {
        let addresses = serde_json::to_value(vec![&guest.address]).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to encode address book: {e}"))
        })?;

        let row = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO accounts (email, name, role, points, password_hash, addresses)
            VALUES ($1, $2, 'shopper', 0, $3, $4)
            RETURNING id, email, name, role, points, addresses, created_at, updated_at
            ",
        )
        .bind(guest.email.as_str())
        .bind(&guest.name)
        .bind(&guest.password_placeholder)
        .bind(addresses)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("account already exists: {}", guest.email))
            }
            _ => RepositoryError::Database(e),
        })?;

        row.into_account()
    }

    async fn adjust_points(
        &self,
        id: AccountId,
        spent: i64,
        earned: i64,
    ) -> Result<(), RepositoryError> {
        // Single statement so concurrent checkouts against the same account
        // cannot lose an update; the floor guards a racing spend.
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET points = GREATEST(points - $2 + $3, 0), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_i64())
        .bind(spent)
        .bind(earned)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
