//! Shared newtype wrappers used across the workspace.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{AccountId, CouponId, OrderId, ProductId};
pub use money::Money;
pub use status::{OrderStatus, StatusEntry};
