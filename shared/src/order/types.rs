//! Order status axes, line items and customer contact types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Business order status (fulfillment stage)
///
/// The state machine is deliberately permissive: any status may be set from
/// any other. Admins rely on this for manual correction; the stock side
/// effect is gated separately on `stock_reduced`, never on the prior status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    /// Payment confirmed
    Cobrada,
    Shipped,
    Delivered,
    Cancelled,
    /// Payment rejected
    Rechazada,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Rechazada
        )
    }
}

/// Gateway-reported payment state, tracked independently of business status.
///
/// A payment can be `Approved` while the business status is still `Pending`
/// awaiting manual confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unset,
    Pending,
    Approved,
    Rejected,
    Refunded,
    ChargedBack,
}

/// Customer's declared notification channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactPreference {
    #[default]
    Email,
    Chat,
}

/// Shipping address (only present for shipping delivery)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub street: String,
    #[validate(length(min = 1))]
    pub city: String,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

/// Delivery method
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "address", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    Pickup,
    Shipping(ShippingAddress),
}

/// Customer contact info captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Chat identifier (e.g. Telegram handle); required for chat routing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_handle: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
}

/// Line item — prices are snapshots taken at order creation.
///
/// Later product price changes never retroactively alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Append-only status history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: i64,
    pub actor: String,
}

/// Admin-to-customer message (distinct from status history)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMessage {
    pub text: String,
    pub timestamp: i64,
    pub actor: String,
}
