//! Public order submission.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use menuboard_core::{Email, Order, OrderId, OrderLineItem, OrderStatus, Price, TenantId};

use crate::error::FunctionError;
use crate::services::notify::OrderCreated;
use crate::store::{DocumentStore, layout};

/// An order as sent by a customer, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    #[serde(default)]
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub name: String,
    #[serde(default = "one")]
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub item_id: Option<String>,
}

const fn one() -> u32 {
    1
}

impl OrderInput {
    /// Validate into a pending [`Order`] stamped with the current time.
    fn into_order(self) -> Result<Order, FunctionError> {
        let customer_name = self.customer_name.trim().to_owned();
        if customer_name.is_empty() {
            return Err(FunctionError::InvalidArgument(
                "customerName is required".to_owned(),
            ));
        }
        if self.items.is_empty() {
            return Err(FunctionError::InvalidArgument(
                "an order needs at least one item".to_owned(),
            ));
        }

        let items = self
            .items
            .into_iter()
            .map(|line| {
                if line.quantity == 0 {
                    return Err(FunctionError::InvalidArgument(format!(
                        "quantity for {:?} must be at least 1",
                        line.name
                    )));
                }
                Ok(OrderLineItem {
                    name: line.name,
                    quantity: line.quantity,
                    price: Price::new(line.price)?,
                    item_id: line.item_id,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let customer_email = self
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(Email::parse)
            .transpose()?;

        Ok(Order {
            items,
            customer_name,
            customer_email,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

/// Stores customer orders and announces them.
#[derive(Clone)]
pub struct OrderService<D> {
    documents: D,
    events: mpsc::UnboundedSender<OrderCreated>,
}

impl<D: DocumentStore> OrderService<D> {
    pub const fn new(documents: D, events: mpsc::UnboundedSender<OrderCreated>) -> Self {
        Self { documents, events }
    }

    /// Validate and store an order for `tenant`, then publish [`OrderCreated`].
    ///
    /// The notification runs on its own; its outcome never reaches the caller.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown store or a malformed order, `Internal`
    /// if the document store fails.
    #[instrument(skip(self, input), fields(tenant = %tenant))]
    pub async fn submit(
        &self,
        tenant: &TenantId,
        input: OrderInput,
    ) -> Result<OrderId, FunctionError> {
        let profile = layout::profile_root(tenant)?;
        if self.documents.get(&profile).await?.is_none() {
            return Err(FunctionError::InvalidArgument(format!(
                "unknown store: {tenant}"
            )));
        }

        let order = input.into_order()?;
        let total = order.total()?;

        let root = layout::submissions_root(tenant)?;
        if self.documents.get(&root).await?.is_none() {
            self.documents
                .set(&root, serde_json::json!({ "createdAt": order.created_at }))
                .await?;
        }

        let order_id = OrderId::generate();
        let body = serde_json::to_value(&order)
            .map_err(|e| FunctionError::Internal(format!("failed to encode order: {e}")))?;
        self.documents
            .set(&layout::order_doc(tenant, &order_id)?, body)
            .await?;

        info!(order_id = %order_id, total = %total.amount(), "Order stored");

        let event = OrderCreated {
            tenant: tenant.clone(),
            order_id: order_id.clone(),
            order,
        };
        if self.events.send(event).is_err() {
            warn!(order_id = %order_id, "Notification worker is gone, order stored without email");
        }

        Ok(order_id)
    }
}
