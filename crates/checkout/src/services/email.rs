//! Order confirmation email via SMTP.
//!
//! Confirmation mail is best-effort: when SMTP is not configured the sender
//! is a no-op, and delivery failures are reported to the caller as a
//! [`NotificationError`] to log and move on.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use tracing::debug;

use tamarind_core::Email;

use crate::config::EmailConfig;
use crate::models::Order;
use crate::stores::{ConfirmationSender, NotificationError};

/// SMTP-backed [`ConfirmationSender`].
#[derive(Clone)]
pub struct SmtpConfirmationSender {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl SmtpConfirmationSender {
    /// Create a sender from optional SMTP configuration. Without
    /// configuration the sender silently drops messages.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be constructed.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self {
                mailer: None,
                from_address: String::new(),
            });
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(mailer),
            from_address: config.from_address.clone(),
        })
    }
}

impl ConfirmationSender for SmtpConfirmationSender {
    async fn send_order_confirmation(
        &self,
        to: &Email,
        order: &Order,
    ) -> Result<(), NotificationError> {
        let Some(mailer) = &self.mailer else {
            debug!(order_id = %order.id, "SMTP not configured, skipping confirmation email");
            return Ok(());
        };

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotificationError(format!("invalid from address: {}", self.from_address)))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| NotificationError(format!("invalid recipient: {to}")))?)
            .subject(format!("Your Tamarind order #{}", order.id))
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(order))
            .map_err(|e| NotificationError(e.to_string()))?;

        mailer
            .send(message)
            .await
            .map_err(|e| NotificationError(e.to_string()))?;

        debug!(order_id = %order.id, to = %to, "confirmation email sent");
        Ok(())
    }
}

/// Plain-text order summary.
fn confirmation_body(order: &Order) -> String {
    use std::fmt::Write;

    let mut body = format!(
        "Hi {},\n\nThanks for your order #{}.\n\n",
        order.shipping.name, order.id
    );

    for line in &order.lines {
        let variant = line
            .variant
            .as_deref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default();
        let _ = writeln!(
            body,
            "  {} x{}{} - {}",
            line.name,
            line.quantity,
            variant,
            line.total()
        );
    }

    let t = &order.totals;
    let _ = write!(
        body,
        "\nSubtotal: {}\nTax: {}\nShipping: {}\n",
        t.subtotal, t.tax, t.shipping_fee
    );
    if !t.coupon_discount.is_zero() {
        let _ = writeln!(body, "Coupon discount: -{}", t.coupon_discount);
    }
    if !t.loyalty_discount.is_zero() {
        let _ = writeln!(body, "Loyalty discount: -{}", t.loyalty_discount);
    }
    let _ = write!(body, "Total: {}\n\n", t.total);

    if order.points_earned > 0 {
        let _ = writeln!(body, "You earned {} loyalty points.", order.points_earned);
    }

    body.push_str("\nWe'll let you know when your order ships.\nTamarind Trading Co\n");
    body
}
