//! Order lifecycle manager
//!
//! Single entry point for every order mutation: creation, status
//! transitions, cancellation, archiving, messages and tracking info. Each
//! operation is one redb write transaction; stock side effects go through
//! the inventory ledger inside that same transaction, so an order update
//! and its stock movement commit together or not at all.
//!
//! The stock side effect of a transition depends only on the order's
//! `stock_reduced` flag and the target status, never on the prior status.
//! That makes repeated webhook deliveries and manual admin corrections
//! naturally idempotent with respect to inventory.

pub mod error;

pub use error::{LifecycleError, LifecycleResult};

use std::collections::HashMap;

use redb::WriteTransaction;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::discounts::{self, CouponRejection};
use crate::ledger::{InventoryLedger, LedgerError, StockAdjustment, StockReason};
use crate::money;
use crate::storage::StoreStorage;
use chrono::Datelike;
use shared::order::{
    CustomerInfo, DeliveryMethod, LineItem, Order, OrderStatus, PaymentStatus,
};
use shared::util::{now_millis, snowflake_id, tracking_token};

/// One cart line in an inbound order draft
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartLine {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Inbound checkout payload; everything else on the order is derived
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderDraft {
    #[validate(nested)]
    pub customer: CustomerInfo,
    pub delivery: DeliveryMethod,
    #[validate(length(min = 1), nested)]
    pub items: Vec<CartLine>,
    pub coupon_code: Option<String>,
    #[validate(length(min = 1))]
    pub payment_method: String,
    #[serde(default)]
    pub shipping_cost: f64,
    pub customer_note: Option<String>,
}

/// What a stock-affecting transition did, reported to the caller so it can
/// route notifications
#[derive(Debug)]
pub struct TransitionOutcome {
    pub order: Order,
    /// Stock movements performed by this transition (empty when the gate
    /// suppressed the side effect)
    pub adjustments: Vec<StockAdjustment>,
}

impl TransitionOutcome {
    /// Adjustments that crossed the low-stock threshold
    pub fn low_stock(&self) -> impl Iterator<Item = &StockAdjustment> {
        self.adjustments.iter().filter(|a| a.low_stock)
    }
}

/// Stock side effect of landing on a status, given the gate flag
#[derive(Debug, PartialEq, Eq)]
enum StockAction {
    Keep,
    Deduct,
    Restore,
}

fn stock_action(stock_reduced: bool, new_status: OrderStatus) -> StockAction {
    match new_status {
        OrderStatus::Cobrada if !stock_reduced => StockAction::Deduct,
        OrderStatus::Cancelled | OrderStatus::Rechazada if stock_reduced => StockAction::Restore,
        _ => StockAction::Keep,
    }
}

/// Order lifecycle manager
#[derive(Clone)]
pub struct OrderLifecycle {
    storage: StoreStorage,
    ledger: InventoryLedger,
    currency: String,
}

impl OrderLifecycle {
    pub fn new(storage: StoreStorage, ledger: InventoryLedger, currency: impl Into<String>) -> Self {
        Self {
            storage,
            ledger,
            currency: currency.into(),
        }
    }

    // ========== Creation ==========

    /// Create an order from a checkout draft.
    ///
    /// All-or-nothing: every line's product must exist, be active and have
    /// enough stock; a rejected coupon fails the whole creation. Prices are
    /// snapshotted from the product records. The per-year order counter and
    /// the coupon usage count are incremented inside the same transaction
    /// as the order insert. Stock is NOT deducted here — that happens when
    /// the order transitions to a paid status.
    pub fn create_order(&self, draft: &OrderDraft, actor: &str) -> LifecycleResult<Order> {
        draft.validate()?;
        money::validate_amount(draft.shipping_cost, "shipping_cost")?;
        if let DeliveryMethod::Shipping(address) = &draft.delivery {
            address.validate()?;
        }

        let now = now_millis();
        let txn = self.storage.begin_write()?;

        // Sufficiency is judged against the cart's total demand per
        // product, so duplicate lines for one product cannot slip past a
        // per-line check and create an order that can never be paid
        let mut required: HashMap<i64, i64> = HashMap::new();
        for line in &draft.items {
            money::validate_quantity(line.quantity)?;
            *required.entry(line.product_id).or_default() += line.quantity;
        }

        // Resolve every line against the catalog before touching anything
        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let product = self
                .storage
                .get_product_txn(&txn, line.product_id)?
                .ok_or(LifecycleError::ProductNotFound(line.product_id))?;
            if !product.is_active {
                return Err(LifecycleError::ProductInactive(product.name));
            }
            let requested = required[&line.product_id];
            if product.stock < requested {
                return Err(LedgerError::InsufficientStock {
                    name: product.name,
                    stock: product.stock,
                    requested,
                }
                .into());
            }
            items.push(LineItem {
                product_id: product.id,
                name: product.name,
                quantity: line.quantity,
                unit_price: product.price_ars,
                line_total: money::line_total(product.price_ars, line.quantity),
            });
        }
        let subtotal = money::sum(items.iter().map(|i| i.line_total));

        // Coupon: validate against the cart, redeem inside this transaction
        let coupon = match &draft.coupon_code {
            Some(code) => {
                let mut coupon = self
                    .storage
                    .find_coupon_by_code(code)?
                    .ok_or(CouponRejection::NotFound)?;
                discounts::validate_coupon(&coupon, &items, subtotal, now)?;
                coupon.uses_count += 1;
                self.storage.store_coupon(&txn, &coupon)?;
                Some(coupon)
            }
            None => None,
        };

        let promotions = self.storage.get_all_promotions()?;
        let outcome = discounts::evaluate(&items, subtotal, coupon.as_ref(), &promotions, now);

        let year = chrono::Utc::now().year();
        let seq = self.storage.next_order_sequence(&txn, year)?;
        let order_number = format!("ORD-{}-{:05}", year, seq);

        let mut order = Order {
            id: snowflake_id().to_string(),
            order_number,
            tracking_token: tracking_token(),
            items,
            subtotal,
            discount_promotion: outcome.discount_promotion,
            discount_coupon: outcome.discount_coupon,
            coupon_code: outcome.coupon_code,
            shipping_cost: draft.shipping_cost,
            total: money::order_total(
                subtotal,
                outcome.discount_promotion,
                outcome.discount_coupon,
                draft.shipping_cost,
            ),
            currency: self.currency.clone(),
            payment_method: draft.payment_method.clone(),
            customer: draft.customer.clone(),
            delivery: draft.delivery.clone(),
            customer_note: draft.customer_note.clone(),
            status: OrderStatus::Pending,
            status_history: Vec::new(),
            payment_status: PaymentStatus::Unset,
            stock_reduced: false,
            tracking_number: None,
            tracking_url: None,
            messages: Vec::new(),
            archived_date: None,
            created_at: now,
            updated_at: now,
        };
        order.push_status(OrderStatus::Pending, actor);

        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    // ========== Transitions ==========

    /// Move an order to a new status.
    ///
    /// Any target status is accepted from any current status; the stock
    /// side effect is decided solely by `stock_reduced` and the target.
    pub fn transition(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        actor: &str,
    ) -> LifecycleResult<TransitionOutcome> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;
        let adjustments = self.transition_in(&txn, &mut order, new_status, actor)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(TransitionOutcome { order, adjustments })
    }

    /// Transition within the caller's transaction (also used by the
    /// payment reconciler to combine with a payment-status update).
    fn transition_in(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        new_status: OrderStatus,
        actor: &str,
    ) -> LifecycleResult<Vec<StockAdjustment>> {
        let adjustments = match stock_action(order.stock_reduced, new_status) {
            StockAction::Keep => Vec::new(),
            StockAction::Deduct => {
                let mut adjustments = Vec::with_capacity(order.items.len());
                for line in &order.items {
                    // Any failure aborts the whole transition: stock and
                    // status never commit partially
                    adjustments.push(self.ledger.adjust_stock_in(
                        txn,
                        line.product_id,
                        -line.quantity,
                        StockReason::OrderPaid,
                        actor,
                    )?);
                }
                order.stock_reduced = true;
                adjustments
            }
            StockAction::Restore => {
                let reason = if new_status == OrderStatus::Rechazada {
                    StockReason::OrderRejected
                } else {
                    StockReason::OrderCancelled
                };
                let mut adjustments = Vec::new();
                for line in &order.items {
                    match self.ledger.adjust_stock_in(
                        txn,
                        line.product_id,
                        line.quantity,
                        reason,
                        actor,
                    ) {
                        Ok(adjustment) => adjustments.push(adjustment),
                        // A product deleted after the sale must not block
                        // the cancellation itself
                        Err(LedgerError::ProductNotFound(id)) => {
                            tracing::warn!(
                                order_id = %order.id,
                                product_id = id,
                                "Stock restore skipped: product no longer exists"
                            );
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                order.stock_reduced = false;
                adjustments
            }
        };

        order.push_status(new_status, actor);
        self.storage.store_order(txn, order)?;

        tracing::info!(
            order_id = %order.id,
            status = ?new_status,
            stock_moves = adjustments.len(),
            actor,
            "Order transitioned"
        );
        Ok(adjustments)
    }

    /// Cancel an order, recording the reason as an order message.
    ///
    /// Only non-terminal, unshipped orders can be cancelled; anything past
    /// `Cobrada` needs a manual status correction instead.
    pub fn cancel_order(
        &self,
        order_id: &str,
        reason: Option<&str>,
        actor: &str,
    ) -> LifecycleResult<TransitionOutcome> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;

        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Cobrada) {
            return Err(LifecycleError::CancelNotAllowed {
                status: order.status,
            });
        }

        if let Some(reason) = reason {
            order.push_message(format!("Pedido cancelado: {}", reason), actor);
        }
        let adjustments = self.transition_in(&txn, &mut order, OrderStatus::Cancelled, actor)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(TransitionOutcome { order, adjustments })
    }

    /// Customer-initiated cancellation via the unauthenticated tracking
    /// token. Same gate as `cancel_order`.
    pub fn cancel_order_by_token(
        &self,
        token: &str,
        reason: Option<&str>,
    ) -> LifecycleResult<TransitionOutcome> {
        let order = self
            .storage
            .find_order_by_token(token)?
            .ok_or_else(|| LifecycleError::OrderNotFound(token.to_string()))?;
        self.cancel_order(&order.id, reason, "customer")
    }

    /// Update the gateway payment axis and optionally transition the
    /// business status, atomically.
    pub fn record_payment(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        new_status: Option<OrderStatus>,
        actor: &str,
    ) -> LifecycleResult<TransitionOutcome> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;

        order.payment_status = payment_status;
        order.updated_at = now_millis();
        let adjustments = match new_status {
            Some(status) => self.transition_in(&txn, &mut order, status, actor)?,
            None => {
                self.storage.store_order(&txn, &order)?;
                Vec::new()
            }
        };
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(TransitionOutcome { order, adjustments })
    }

    // ========== Messages and tracking ==========

    /// Prepend an admin message to the order
    pub fn add_message(&self, order_id: &str, text: &str, actor: &str) -> LifecycleResult<Order> {
        self.update_order(order_id, |order| {
            order.push_message(text, actor);
        })
    }

    /// Set carrier tracking info
    pub fn set_tracking(
        &self,
        order_id: &str,
        tracking_number: Option<String>,
        tracking_url: Option<String>,
    ) -> LifecycleResult<Order> {
        self.update_order(order_id, |order| {
            order.tracking_number = tracking_number;
            order.tracking_url = tracking_url;
            order.updated_at = now_millis();
        })
    }

    fn update_order(
        &self,
        order_id: &str,
        mutate: impl FnOnce(&mut Order),
    ) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;
        mutate(&mut order);
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(order)
    }

    // ========== Archive ==========

    /// Move an order to the archive, stamping `archived_date`.
    /// The cross-table move is one transaction: both or neither.
    pub fn archive_order(&self, order_id: &str) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))?;
        order.archived_date = Some(now_millis());
        self.storage.store_archived_order(&txn, &order)?;
        self.storage.remove_order(&txn, order_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        tracing::info!(order_id = %order.id, "Order archived");
        Ok(order)
    }

    /// Move an archived order back to the active set, clearing
    /// `archived_date`
    pub fn restore_archived_order(&self, order_id: &str) -> LifecycleResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_archived_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::ArchivedOrderNotFound(order_id.to_string()))?;
        order.archived_date = None;
        self.storage.store_order(&txn, &order)?;
        self.storage.remove_archived_order(&txn, order_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        tracing::info!(order_id = %order.id, "Order restored from archive");
        Ok(order)
    }

    /// Permanently delete an archived order. The only hard delete in the
    /// order subsystem; active orders must be archived first.
    pub fn delete_archived_order(&self, order_id: &str) -> LifecycleResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage
            .get_archived_order_txn(&txn, order_id)?
            .ok_or_else(|| LifecycleError::ArchivedOrderNotFound(order_id.to_string()))?;
        self.storage.remove_archived_order(&txn, order_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        tracing::info!(order_id, "Archived order deleted");
        Ok(())
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> LifecycleResult<Option<Order>> {
        Ok(self.storage.get_order(order_id)?)
    }

    /// Customer-facing lookup by tracking token
    pub fn find_order_by_token(&self, token: &str) -> LifecycleResult<Option<Order>> {
        Ok(self.storage.find_order_by_token(token)?)
    }

    pub fn list_orders(&self) -> LifecycleResult<Vec<Order>> {
        Ok(self.storage.get_all_orders()?)
    }

    pub fn list_archived_orders(&self) -> LifecycleResult<Vec<Order>> {
        Ok(self.storage.get_all_archived_orders()?)
    }
}

#[cfg(test)]
mod tests;
