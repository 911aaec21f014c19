//! Payment gateway reconciliation
//!
//! Maps asynchronous gateway notices (webhooks, poll results) onto the
//! order lifecycle. Gateways redeliver notices at-least-once and out of
//! order; this layer stays safe under both because every stock side effect
//! is gated inside the lifecycle, and because an unknown reference is a
//! logged anomaly rather than a crash.

use serde::Deserialize;
use thiserror::Error;

use crate::lifecycle::{LifecycleError, OrderLifecycle, TransitionOutcome};
use crate::money;
use crate::notify::Notifier;
use shared::order::{Order, OrderStatus, PaymentStatus};

/// Gateway-reported payment state
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentNoticeStatus {
    Approved,
    Pending,
    Rejected,
    Refunded,
    ChargedBack,
}

/// Stage of a chargeback dispute
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChargebackAction {
    Created,
    Won,
    Lost,
}

/// One normalized notice from the payment gateway
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotice {
    /// Gateway's own payment id
    pub payment_id: String,
    /// Our order id, echoed back by the gateway
    pub external_reference: String,
    pub status: PaymentNoticeStatus,
    pub amount: f64,
    #[serde(default)]
    pub fee_amount: Option<f64>,
    #[serde(default)]
    pub chargeback_action: Option<ChargebackAction>,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Payment notice references unknown order: {0}")]
    UnknownReference(String),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Applies gateway notices to orders and fires the resulting notifications
#[derive(Clone)]
pub struct PaymentReconciler {
    lifecycle: OrderLifecycle,
    notifier: Notifier,
}

impl PaymentReconciler {
    pub fn new(lifecycle: OrderLifecycle, notifier: Notifier) -> Self {
        Self {
            lifecycle,
            notifier,
        }
    }

    /// Apply one notice. Returns the order as it stands afterwards.
    pub fn apply(&self, notice: &PaymentNotice) -> ReconcileResult<Order> {
        let Some(order) = self.lifecycle.get_order(&notice.external_reference)? else {
            tracing::warn!(
                payment_id = %notice.payment_id,
                external_reference = %notice.external_reference,
                status = ?notice.status,
                "Payment notice for unknown order"
            );
            return Err(ReconcileError::UnknownReference(
                notice.external_reference.clone(),
            ));
        };

        if money::round_money((notice.amount - order.total).abs()) > 0.0 {
            // Reconciliation anomaly worth a human look; the notice is
            // still applied, the gateway's money is authoritative
            tracing::warn!(
                order_id = %order.id,
                notice_amount = notice.amount,
                order_total = order.total,
                "Payment amount differs from order total"
            );
        }

        let actor = format!("gateway:{}", notice.payment_id);
        let (payment_status, new_status) = match notice.status {
            PaymentNoticeStatus::Approved => (PaymentStatus::Approved, Some(OrderStatus::Cobrada)),
            PaymentNoticeStatus::Pending => (PaymentStatus::Pending, None),
            PaymentNoticeStatus::Rejected => {
                (PaymentStatus::Rejected, Some(OrderStatus::Rechazada))
            }
            PaymentNoticeStatus::Refunded => {
                (PaymentStatus::Refunded, Some(OrderStatus::Rechazada))
            }
            PaymentNoticeStatus::ChargedBack => match notice.chargeback_action {
                // A dispute resolved in our favor restores the payment
                // axis; the business status and stock stay as they are
                Some(ChargebackAction::Won) => {
                    self.lifecycle
                        .record_payment(&order.id, PaymentStatus::Approved, None, &actor)?;
                    let order = self.lifecycle.add_message(
                        &order.id,
                        "Contracargo resuelto a favor del comercio",
                        &actor,
                    )?;
                    return Ok(order);
                }
                // `created` and `lost` both pull the order out of
                // fulfillment; absent action means the dispute just opened
                Some(ChargebackAction::Created) | Some(ChargebackAction::Lost) | None => {
                    (PaymentStatus::ChargedBack, Some(OrderStatus::Rechazada))
                }
            },
        };

        let outcome = self
            .lifecycle
            .record_payment(&order.id, payment_status, new_status, &actor)?;
        self.dispatch_notifications(&outcome, new_status);

        tracing::info!(
            order_id = %outcome.order.id,
            payment_id = %notice.payment_id,
            payment_status = ?payment_status,
            status = ?outcome.order.status,
            "Payment notice applied"
        );
        Ok(outcome.order)
    }

    fn dispatch_notifications(&self, outcome: &TransitionOutcome, transitioned: Option<OrderStatus>) {
        if transitioned.is_some() {
            self.notifier.notify_status(&outcome.order);
        }
        for adjustment in outcome.low_stock() {
            self.notifier.notify_low_stock(adjustment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InventoryLedger;
    use crate::lifecycle::{CartLine, OrderDraft};
    use crate::notify::{Channel, NotificationSink};
    use crate::storage::StoreStorage;
    use shared::models::Product;
    use shared::order::{ContactPreference, CustomerInfo, DeliveryMethod};
    use shared::util::now_millis;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(Channel, String, String)>>,
    }

    impl NotificationSink for RecordingSink {
        fn send(&self, channel: Channel, recipient: &str, message: &str) -> bool {
            self.sent
                .lock()
                .unwrap()
                .push((channel, recipient.to_string(), message.to_string()));
            true
        }
    }

    fn setup() -> (StoreStorage, PaymentReconciler, Arc<RecordingSink>) {
        let storage = StoreStorage::open_in_memory().unwrap();
        let ledger = InventoryLedger::new(storage.clone(), 100);
        let lifecycle = OrderLifecycle::new(storage.clone(), ledger, "ARS");
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone(), "admin@example.com");
        (
            storage.clone(),
            PaymentReconciler::new(lifecycle, notifier),
            sink,
        )
    }

    fn seed_product(storage: &StoreStorage, id: i64, stock: i64) {
        let txn = storage.begin_write().unwrap();
        storage
            .store_product(
                &txn,
                &Product {
                    id,
                    name: format!("Producto {}", id),
                    description: None,
                    price_ars: 100.0,
                    price_usd: None,
                    stock,
                    stock_alert: 2,
                    image: None,
                    sort_order: 0,
                    is_active: true,
                    created_at: now_millis(),
                    updated_at: now_millis(),
                },
            )
            .unwrap();
        txn.commit().unwrap();
    }

    fn create_order(storage: &StoreStorage, reconciler: &PaymentReconciler, qty: i64) -> Order {
        seed_product(storage, 1, 10);
        let draft = OrderDraft {
            customer: CustomerInfo {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: None,
                chat_handle: None,
                contact_preference: ContactPreference::Email,
            },
            delivery: DeliveryMethod::Pickup,
            items: vec![CartLine {
                product_id: 1,
                quantity: qty,
            }],
            coupon_code: None,
            payment_method: "mercadopago".to_string(),
            shipping_cost: 0.0,
            customer_note: None,
        };
        reconciler.lifecycle.create_order(&draft, "web").unwrap()
    }

    fn notice(order: &Order, status: PaymentNoticeStatus) -> PaymentNotice {
        PaymentNotice {
            payment_id: "pay-1".to_string(),
            external_reference: order.id.clone(),
            status,
            amount: order.total,
            fee_amount: None,
            chargeback_action: None,
        }
    }

    fn stock(storage: &StoreStorage, id: i64) -> i64 {
        storage.get_product(id).unwrap().unwrap().stock
    }

    #[test]
    fn test_approved_collects_and_deducts() {
        let (storage, reconciler, sink) = setup();
        let order = create_order(&storage, &reconciler, 3);

        let updated = reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Approved))
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cobrada);
        assert_eq!(updated.payment_status, PaymentStatus::Approved);
        assert!(updated.stock_reduced);
        assert_eq!(stock(&storage, 1), 7);

        // Payment-confirmed notification went out
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "ana@example.com");
    }

    #[test]
    fn test_duplicate_approved_notice_is_stock_idempotent() {
        let (storage, reconciler, _sink) = setup();
        let order = create_order(&storage, &reconciler, 3);
        let n = notice(&order, PaymentNoticeStatus::Approved);

        reconciler.apply(&n).unwrap();
        let updated = reconciler.apply(&n).unwrap();
        assert_eq!(stock(&storage, 1), 7);
        // Both deliveries are recorded in history (creation + 2 notices)
        assert_eq!(updated.status_history.len(), 3);
    }

    #[test]
    fn test_pending_touches_payment_axis_only() {
        let (storage, reconciler, sink) = setup();
        let order = create_order(&storage, &reconciler, 1);

        let updated = reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Pending))
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Pending);
        assert_eq!(updated.payment_status, PaymentStatus::Pending);
        assert_eq!(stock(&storage, 1), 10);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rejected_marks_rechazada() {
        let (storage, reconciler, _sink) = setup();
        let order = create_order(&storage, &reconciler, 1);

        let updated = reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Rejected))
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Rechazada);
        assert_eq!(updated.payment_status, PaymentStatus::Rejected);
        // Never paid, so nothing to restore
        assert_eq!(stock(&storage, 1), 10);
    }

    #[test]
    fn test_refund_after_approval_restores_stock() {
        let (storage, reconciler, _sink) = setup();
        let order = create_order(&storage, &reconciler, 3);

        reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Approved))
            .unwrap();
        assert_eq!(stock(&storage, 1), 7);

        let updated = reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Refunded))
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Rechazada);
        assert_eq!(updated.payment_status, PaymentStatus::Refunded);
        assert!(!updated.stock_reduced);
        assert_eq!(stock(&storage, 1), 10);
    }

    #[test]
    fn test_chargeback_lost_restores_stock() {
        let (storage, reconciler, _sink) = setup();
        let order = create_order(&storage, &reconciler, 2);
        reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Approved))
            .unwrap();

        let mut n = notice(&order, PaymentNoticeStatus::ChargedBack);
        n.chargeback_action = Some(ChargebackAction::Lost);
        let updated = reconciler.apply(&n).unwrap();
        assert_eq!(updated.status, OrderStatus::Rechazada);
        assert_eq!(updated.payment_status, PaymentStatus::ChargedBack);
        assert_eq!(stock(&storage, 1), 10);
    }

    #[test]
    fn test_chargeback_won_leaves_stock_and_status() {
        let (storage, reconciler, _sink) = setup();
        let order = create_order(&storage, &reconciler, 2);
        reconciler
            .apply(&notice(&order, PaymentNoticeStatus::Approved))
            .unwrap();

        let mut n = notice(&order, PaymentNoticeStatus::ChargedBack);
        n.chargeback_action = Some(ChargebackAction::Won);
        let updated = reconciler.apply(&n).unwrap();
        assert_eq!(updated.status, OrderStatus::Cobrada);
        assert_eq!(updated.payment_status, PaymentStatus::Approved);
        assert_eq!(stock(&storage, 1), 8);

        // Resolution note recorded for the admin trail
        let order = storage.get_order(&order.id).unwrap().unwrap();
        assert!(order.messages[0].text.contains("Contracargo"));
    }

    #[test]
    fn test_unknown_reference_is_an_error_not_a_crash() {
        let (_storage, reconciler, _sink) = setup();
        let n = PaymentNotice {
            payment_id: "pay-9".to_string(),
            external_reference: "no-such-order".to_string(),
            status: PaymentNoticeStatus::Approved,
            amount: 100.0,
            fee_amount: None,
            chargeback_action: None,
        };
        assert!(matches!(
            reconciler.apply(&n),
            Err(ReconcileError::UnknownReference(_))
        ));
    }

    #[test]
    fn test_notice_deserializes_from_gateway_json() {
        let n: PaymentNotice = serde_json::from_str(
            r#"{
                "payment_id": "123",
                "external_reference": "o-1",
                "status": "charged_back",
                "amount": 150.5,
                "chargeback_action": "won"
            }"#,
        )
        .unwrap();
        assert_eq!(n.status, PaymentNoticeStatus::ChargedBack);
        assert_eq!(n.chargeback_action, Some(ChargebackAction::Won));
        assert_eq!(n.fee_amount, None);
    }
}
