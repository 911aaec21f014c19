//! Lifecycle error types

use thiserror::Error;

use crate::discounts::CouponRejection;
use crate::ledger::LedgerError;
use crate::storage::StorageError;
use shared::order::OrderStatus;

/// Errors from order lifecycle operations
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Coupon(#[from] CouponRejection),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Archived order not found: {0}")]
    ArchivedOrderNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Product is not available for sale: {0}")]
    ProductInactive(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] crate::money::AmountError),

    #[error("Order cannot be cancelled from status {status:?}")]
    CancelNotAllowed { status: OrderStatus },
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
