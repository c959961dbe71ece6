//! Order notification emails.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain-text templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use menuboard_core::{CurrencyCode, Email, Order, OrderId, PriceError, TenantProfile};

use crate::config::EmailConfig;
use crate::services::notify::{MailTransport, OutgoingMail};

/// One rendered order line.
struct LineView {
    name: String,
    quantity: u32,
    price: String,
    total: String,
}

/// HTML template for the new-order email.
#[derive(Template)]
#[template(path = "email/order_notification.html")]
struct OrderNotificationHtml<'a> {
    store_name: &'a str,
    order_id: &'a str,
    placed_at: &'a str,
    customer_name: &'a str,
    customer_email: Option<&'a str>,
    status: &'a str,
    items: &'a [LineView],
    total: &'a str,
}

/// Plain text template for the new-order email.
#[derive(Template)]
#[template(path = "email/order_notification.txt")]
struct OrderNotificationText<'a> {
    store_name: &'a str,
    order_id: &'a str,
    placed_at: &'a str,
    customer_name: &'a str,
    customer_email: Option<&'a str>,
    status: &'a str,
    items: &'a [LineView],
    total: &'a str,
}

/// Errors that can occur when rendering or sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// A line or order total could not be computed.
    #[error("Invalid order amount: {0}")]
    Amount(#[from] PriceError),

    /// The transport refused the message.
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Render the new-order email for `profile`'s store.
///
/// # Errors
///
/// Returns `EmailError::Amount` if a total overflows and
/// `EmailError::Template` if a template fails to render.
pub fn render_order_notification(
    to: Email,
    profile: &TenantProfile,
    order_id: &OrderId,
    order: &Order,
) -> Result<OutgoingMail, EmailError> {
    let currency: CurrencyCode = profile.currency;
    let items = order
        .items
        .iter()
        .map(|line| {
            Ok(LineView {
                name: line.name.clone(),
                quantity: line.quantity,
                price: line.price.display(currency),
                total: line.line_total()?.display(currency),
            })
        })
        .collect::<Result<Vec<_>, PriceError>>()?;
    let placed_at = order.created_at.format("%Y-%m-%d %H:%M UTC").to_string();
    let status = order.status.to_string();
    let total = order.total()?.display(currency);
    let customer_email = order.customer_email.as_ref().map(Email::as_str);

    let html = OrderNotificationHtml {
        store_name: &profile.name,
        order_id: order_id.as_str(),
        placed_at: &placed_at,
        customer_name: &order.customer_name,
        customer_email,
        status: &status,
        items: &items,
        total: &total,
    }
    .render()?;
    let text = OrderNotificationText {
        store_name: &profile.name,
        order_id: order_id.as_str(),
        placed_at: &placed_at,
        customer_name: &order.customer_name,
        customer_email,
        status: &status,
        items: &items,
        total: &total,
    }
    .render()?;

    Ok(OutgoingMail {
        to,
        subject: format!("New order from {} ({total})", order.customer_name),
        text,
        html,
    })
}

/// SMTP mail transport.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Build a multipart message with both plain text and HTML versions.
    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(mail
                .to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(mail.to.to_string()))?)
            .subject(&mail.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html.clone()),
                    ),
            )?;
        Ok(message)
    }
}

impl MailTransport for EmailService {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
        let message = self.build_message(mail)?;
        self.mailer.send(message).await?;

        tracing::info!(to = %mail.to, subject = %mail.subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use menuboard_core::{OrderLineItem, OrderStatus, Price};

    use super::*;

    fn profile() -> TenantProfile {
        serde_json::from_value(serde_json::json!({
            "name": "Luigi's <Pizza>",
            "email": "luigi@pizza.test",
            "currency": "EUR"
        }))
        .unwrap()
    }

    fn order() -> Order {
        Order {
            items: vec![
                OrderLineItem {
                    name: "Margherita".to_owned(),
                    quantity: 2,
                    price: Price::from_cents(850).unwrap(),
                    item_id: Some("i1".to_owned()),
                },
                OrderLineItem {
                    name: "Tiramisu".to_owned(),
                    quantity: 1,
                    price: Price::from_cents(500).unwrap(),
                    item_id: None,
                },
            ],
            customer_name: "Ada".to_owned(),
            customer_email: Some(Email::parse("ada@example.org").unwrap()),
            status: OrderStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_includes_order_details() {
        let to = Email::parse("luigi@pizza.test").unwrap();
        let mail =
            render_order_notification(to, &profile(), &OrderId::new("o-42"), &order()).unwrap();

        assert_eq!(mail.to.as_str(), "luigi@pizza.test");
        assert_eq!(mail.subject, "New order from Ada (€22.00)");
        for body in [&mail.text, &mail.html] {
            assert!(body.contains("o-42"));
            assert!(body.contains("2026-03-01 18:30 UTC"));
            assert!(body.contains("Margherita"));
            assert!(body.contains("€17.00"));
            assert!(body.contains("ada@example.org"));
            assert!(body.contains("pending"));
        }
    }

    #[test]
    fn test_html_body_is_escaped() {
        let to = Email::parse("luigi@pizza.test").unwrap();
        let mail =
            render_order_notification(to, &profile(), &OrderId::new("o-42"), &order()).unwrap();
        assert!(mail.html.contains("&lt;Pizza&gt;"));
        assert!(mail.text.contains("Luigi's <Pizza>"));
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let mut order = order();
        order.items[0].price = Price::new(rust_decimal::Decimal::MAX).unwrap();
        let to = Email::parse("luigi@pizza.test").unwrap();
        let err =
            render_order_notification(to, &profile(), &OrderId::new("o-43"), &order).unwrap_err();
        assert!(matches!(err, EmailError::Amount(PriceError::Overflow)));
    }
}
