//! Business services for the checkout crate.

pub mod checkout;
pub mod email;

pub use checkout::{
    CheckoutError, CheckoutService, CheckoutSettings, PlaceOrder, PlacedOrder, RequestedItem,
    ShippingContact,
};
pub use email::SmtpConfirmationSender;
