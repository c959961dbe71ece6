//! Document shapes stored under a tenant's partition.
//!
//! All documents serialize with camelCase field names, matching what the
//! management screens and public menu read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::Uid;
use super::price::{CurrencyCode, Price, PriceError};
use super::status::OrderStatus;
use super::subdomain::Subdomain;

const fn default_true() -> bool {
    true
}

/// Store profile, stored at `profile/{tenant}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfile {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Where order notifications go. Kept as free text; validated on use.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl TenantProfile {
    /// The profile's notification address, if present and well-formed.
    #[must_use]
    pub fn notification_email(&self) -> Option<Email> {
        self.email.as_deref().and_then(|e| Email::parse(e).ok())
    }
}

/// One line of a customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    #[serde(default)]
    pub item_id: Option<String>,
}

impl OrderLineItem {
    /// `price * quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product does not fit.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.price.checked_times(self.quantity)
    }
}

/// A customer submission, stored at `submissions/{tenant}/data/{orderId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub items: Vec<OrderLineItem>,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<Email>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if any line or the sum does not fit.
    pub fn total(&self) -> Result<Price, PriceError> {
        self.items
            .iter()
            .try_fold(Price::ZERO, |acc, line| acc.checked_add(line.line_total()?))
    }
}

/// Subdomain registry entry, stored at `subdomains/{autoId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub subdomain: Subdomain,
    pub user_id: Uid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults_and_email() {
        let profile: TenantProfile = serde_json::from_value(serde_json::json!({
            "name": "Trattoria",
            "email": "orders@trattoria.example"
        }))
        .unwrap();
        assert!(profile.is_active);
        assert_eq!(
            profile.notification_email().unwrap().as_str(),
            "orders@trattoria.example"
        );

        let no_email = TenantProfile {
            email: Some("not an email".to_owned()),
            ..profile
        };
        assert!(no_email.notification_email().is_none());
    }

    #[test]
    fn test_order_total() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "items": [
                {"name": "Margherita", "quantity": 2, "price": "9.50"},
                {"name": "Tiramisu", "quantity": 1, "price": "5.00"}
            ],
            "customerName": "Ada",
            "createdAt": "2026-01-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total().unwrap(), Price::from_cents(2400).unwrap());
    }

    #[test]
    fn test_order_total_overflow() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "items": [
                {"name": "Everything", "quantity": 2, "price": "79228162514264337593543950335"}
            ],
            "customerName": "Ada",
            "createdAt": "2026-01-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(order.total(), Err(PriceError::Overflow));
    }
}
