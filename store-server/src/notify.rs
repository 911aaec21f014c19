//! Notification routing
//!
//! Picks the delivery channel from the customer's declared preference and
//! hands the message to a pluggable sink. Delivery is strictly best-effort:
//! a sink failure is a logged warning and never propagates into the order
//! mutation that triggered it.

use std::sync::Arc;

use crate::ledger::StockAdjustment;
use shared::order::{ContactPreference, Order, OrderStatus};

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Email,
    Chat,
}

/// Outbound message transport. Returns whether delivery was accepted.
pub trait NotificationSink: Send + Sync {
    fn send(&self, channel: Channel, recipient: &str, message: &str) -> bool;
}

/// Default sink: writes every notification to the log. Stands in until a
/// real mail/chat transport is wired up.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(&self, channel: Channel, recipient: &str, message: &str) -> bool {
        tracing::info!(channel = ?channel, recipient, message, "Notification");
        true
    }
}

/// Routes customer and admin notifications to a sink
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    /// Where low-stock alerts go (admin email)
    admin_recipient: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, admin_recipient: impl Into<String>) -> Self {
        Self {
            sink,
            admin_recipient: admin_recipient.into(),
        }
    }

    /// Channel + recipient for a customer: chat only when preferred AND a
    /// handle is on file, otherwise email.
    fn route(order: &Order) -> (Channel, &str) {
        match (&order.customer.contact_preference, &order.customer.chat_handle) {
            (ContactPreference::Chat, Some(handle)) => (Channel::Chat, handle.as_str()),
            _ => (Channel::Email, order.customer.email.as_str()),
        }
    }

    /// Tell the customer about a status change. Chat failures fall back to
    /// email before giving up.
    pub fn notify_status(&self, order: &Order) {
        let Some(message) = status_message(order) else {
            return;
        };
        let (channel, recipient) = Self::route(order);
        if self.sink.send(channel, recipient, &message) {
            return;
        }
        if channel == Channel::Chat
            && self
                .sink
                .send(Channel::Email, &order.customer.email, &message)
        {
            tracing::warn!(
                order_id = %order.id,
                recipient,
                "Chat delivery failed, fell back to email"
            );
            return;
        }
        tracing::warn!(
            order_id = %order.id,
            channel = ?channel,
            recipient,
            "Notification delivery failed"
        );
    }

    /// Alert the admin channel that a product crossed its stock threshold
    pub fn notify_low_stock(&self, adjustment: &StockAdjustment) {
        let message = format!(
            "Stock bajo: {} quedan {} unidades",
            adjustment.product_name, adjustment.new_stock
        );
        if !self
            .sink
            .send(Channel::Email, &self.admin_recipient, &message)
        {
            tracing::warn!(
                product_id = adjustment.product_id,
                "Low-stock alert delivery failed"
            );
        }
    }
}

/// Customer-facing message for a status, if that status warrants one
fn status_message(order: &Order) -> Option<String> {
    let body = match order.status {
        OrderStatus::Cobrada => format!("Recibimos tu pago del pedido {}.", order.order_number),
        OrderStatus::Shipped => match &order.tracking_number {
            Some(number) => format!(
                "Tu pedido {} fue despachado. Seguimiento: {}",
                order.order_number, number
            ),
            None => format!("Tu pedido {} fue despachado.", order.order_number),
        },
        OrderStatus::Delivered => format!("Tu pedido {} fue entregado.", order.order_number),
        OrderStatus::Cancelled => format!("Tu pedido {} fue cancelado.", order.order_number),
        OrderStatus::Rechazada => format!(
            "El pago del pedido {} fue rechazado.",
            order.order_number
        ),
        OrderStatus::Pending => return None,
    };
    Some(body)
}
