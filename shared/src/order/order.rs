//! Order aggregate — the customer's purchase record.

use serde::{Deserialize, Serialize};

use super::types::{
    CustomerInfo, DeliveryMethod, LineItem, OrderMessage, OrderStatus, PaymentStatus, StatusEntry,
};
use crate::util::now_millis;

/// The central aggregate of the storefront core.
///
/// Mutated only through the lifecycle manager: status transitions, tracking
/// updates and message additions. `status_history` is append-only and never
/// pruned; `messages` is newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Opaque unique id
    pub id: String,
    /// Human-readable sequential number: `ORD-<year>-<5-digit-seq>`
    pub order_number: String,
    /// Unguessable customer-facing token (>= 128 bits of entropy)
    pub tracking_token: String,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    /// Automatic promotion discount (tracked separately from the coupon)
    pub discount_promotion: f64,
    pub discount_coupon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub shipping_cost: f64,
    /// subtotal − discounts (clamped at zero) + shipping
    pub total: f64,
    pub currency: String,
    pub payment_method: String,
    pub customer: CustomerInfo,
    pub delivery: DeliveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    pub status: OrderStatus,
    /// Append-only log of every status change
    pub status_history: Vec<StatusEntry>,
    /// Gateway payment axis, independent of business `status`
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Single source of truth for whether this order's items have been
    /// deducted from inventory. Gates every stock side effect.
    pub stock_reduced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    /// Admin-to-customer messages, newest-first
    #[serde(default)]
    pub messages: Vec<OrderMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Append a status change to the history and set the current status.
    ///
    /// History is a log, not a set: duplicate-looking entries from repeated
    /// webhook deliveries are legitimate.
    pub fn push_status(&mut self, status: OrderStatus, actor: &str) {
        let now = now_millis();
        self.status_history.push(StatusEntry {
            status,
            timestamp: now,
            actor: actor.to_string(),
        });
        self.status = status;
        self.updated_at = now;
    }

    /// Prepend an admin message (newest-first ordering)
    pub fn push_message(&mut self, text: impl Into<String>, actor: &str) {
        let now = now_millis();
        self.messages.insert(
            0,
            OrderMessage {
                text: text.into(),
                timestamp: now,
                actor: actor.to_string(),
            },
        );
        self.updated_at = now;
    }
}
