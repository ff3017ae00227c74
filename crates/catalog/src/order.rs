//! Storefront orders. The cart is kept as the client sent it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use menuhub_core::{CustomerId, DomainError, DomainResult, FieldErrors, OrderId};

use crate::fields::{REQUIRED, optional_text, required_text};

pub const NAME_MAX: usize = 100;
pub const PHONE_MAX: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Pickup,
    Delivery,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pickup" => Some(Self::Pickup),
            "delivery" => Some(Self::Delivery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user")]
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub cart: Value,
    pub created_at: DateTime<Utc>,
}

/// Order placement request. `customer_id` is filled from the caller's token,
/// never from the body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewOrder {
    #[serde(skip)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub delivery_method: String,
    #[serde(default)]
    pub cart: Value,
}

/// A validated order ready to store.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub cart: Value,
}

impl NewOrder {
    pub fn validate(self) -> DomainResult<OrderDraft> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        let phone = required_text(&mut errors, "phone", &self.phone, PHONE_MAX);
        let address = optional_text(&mut errors, "address", self.address.as_deref(), usize::MAX);

        let delivery_method = DeliveryMethod::parse(&self.delivery_method);
        match delivery_method {
            None if self.delivery_method.trim().is_empty() => errors.push("delivery_method", REQUIRED),
            None => errors.push(
                "delivery_method",
                format!("\"{}\" is not a valid choice", self.delivery_method.trim()),
            ),
            Some(DeliveryMethod::Delivery) if address.is_none() => {
                errors.push("address", "address is required for delivery")
            }
            Some(_) => {}
        }

        match &self.cart {
            Value::Array(items) if !items.is_empty() => {}
            Value::Array(_) => errors.push("cart", "cart must not be empty"),
            Value::Null => errors.push("cart", REQUIRED),
            _ => errors.push("cart", "cart must be a list of items"),
        }

        errors.into_result()?;
        let Some(delivery_method) = delivery_method else {
            return Err(DomainError::validation("delivery_method is invalid"));
        };

        Ok(OrderDraft {
            customer_id: self.customer_id,
            name,
            phone,
            address,
            delivery_method,
            cart: self.cart,
        })
    }
}
