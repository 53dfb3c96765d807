//! Account model.
//!
//! An account is identified by its email address. Guest checkouts create an
//! account on the fly from the shipping contact; such accounts carry a random
//! opaque password placeholder and cannot log in without a separate reset
//! flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tamarind_core::{AccountId, Email};

/// Role tag on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    #[default]
    Shopper,
    Admin,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shopper => write!(f, "shopper"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shopper" => Ok(Self::Shopper),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}

/// A saved address in an account's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Recipient name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Free-form address line.
    pub line: String,
    /// Whether this is the account's default shipping address.
    pub is_default: bool,
}

/// A purchaser account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub name: String,
    pub role: AccountRole,
    /// Loyalty-point balance. Never negative.
    pub points: i64,
    /// Saved addresses.
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a guest account at checkout.
#[derive(Debug, Clone)]
pub struct NewGuestAccount {
    pub email: Email,
    pub name: String,
    /// The shipping address, saved as the account's default.
    pub address: Address,
    /// Random opaque placeholder; the account cannot log in with it.
    pub password_placeholder: String,
}
