//! Inventory ledger — the only sanctioned path for stock mutation
//!
//! Every adjustment is an atomic read-modify-write on the product record:
//! the non-negative invariant is enforced before any mutation, the listing
//! summary is updated in lockstep, and the change is appended to a
//! size-capped audit log with a reason code. Lifecycle-driven changes
//! compose `adjust_stock_in` into their own transaction; admin corrections
//! use the standalone `adjust_stock` entry point.

use redb::{ReadableTable, ReadableTableMetadata, WriteTransaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{STOCK_LOG_TABLE, StorageError, StoreStorage};
use shared::util::now_millis;

/// Default audit log cap (most recent N entries are retained)
pub const DEFAULT_STOCK_LOG_CAP: usize = 500;

/// Reason code attached to every stock adjustment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockReason {
    OrderPaid,
    OrderCancelled,
    OrderRejected,
    ManualAdjustment,
    Restock,
}

/// Audit log entry for one stock adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLogEntry {
    pub product_id: i64,
    pub product_name: String,
    pub old_stock: i64,
    pub new_stock: i64,
    pub delta: i64,
    pub reason: StockReason,
    pub actor: String,
    pub timestamp: i64,
}

/// Outcome of a successful adjustment
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product_id: i64,
    pub product_name: String,
    pub old_stock: i64,
    pub new_stock: i64,
    /// True when the adjustment left `0 < stock <= stock_alert`; the
    /// caller forwards this to the notification sink.
    pub low_stock: bool,
}

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Producto no encontrado: {0}")]
    ProductNotFound(i64),

    #[error("Stock insuficiente para {name}: disponible {stock}, solicitado {requested}")]
    InsufficientStock {
        name: String,
        stock: i64,
        requested: i64,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Inventory ledger over the product table
#[derive(Clone)]
pub struct InventoryLedger {
    storage: StoreStorage,
    log_cap: usize,
}

impl InventoryLedger {
    pub fn new(storage: StoreStorage, log_cap: usize) -> Self {
        Self { storage, log_cap }
    }

    /// Adjust stock within the caller's write transaction.
    ///
    /// Fails without mutation when `old_stock + delta < 0`; the caller's
    /// transaction should be abandoned on error so no partial state commits.
    pub fn adjust_stock_in(
        &self,
        txn: &WriteTransaction,
        product_id: i64,
        delta: i64,
        reason: StockReason,
        actor: &str,
    ) -> LedgerResult<StockAdjustment> {
        let mut product = self
            .storage
            .get_product_txn(txn, product_id)?
            .ok_or(LedgerError::ProductNotFound(product_id))?;

        let old_stock = product.stock;
        let new_stock = old_stock + delta;
        if new_stock < 0 {
            return Err(LedgerError::InsufficientStock {
                name: product.name.clone(),
                stock: old_stock,
                requested: -delta,
            });
        }

        product.stock = new_stock;
        product.updated_at = now_millis();
        self.storage.store_product(txn, &product)?;

        self.append_log(
            txn,
            &StockLogEntry {
                product_id,
                product_name: product.name.clone(),
                old_stock,
                new_stock,
                delta,
                reason,
                actor: actor.to_string(),
                timestamp: now_millis(),
            },
        )?;

        tracing::info!(
            product_id,
            old_stock,
            new_stock,
            delta,
            reason = ?reason,
            actor,
            "Stock adjusted"
        );

        let low_stock = new_stock > 0 && new_stock <= product.stock_alert;
        Ok(StockAdjustment {
            product_id,
            product_name: product.name,
            old_stock,
            new_stock,
            low_stock,
        })
    }

    /// Standalone adjustment in its own transaction (admin corrections,
    /// restocking). Same contract as `adjust_stock_in`.
    pub fn adjust_stock(
        &self,
        product_id: i64,
        delta: i64,
        reason: StockReason,
        actor: &str,
    ) -> LedgerResult<StockAdjustment> {
        let txn = self.storage.begin_write()?;
        let adjustment = self.adjust_stock_in(&txn, product_id, delta, reason, actor)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(adjustment)
    }

    /// Append to the audit log, pruning down to the configured cap
    fn append_log(&self, txn: &WriteTransaction, entry: &StockLogEntry) -> LedgerResult<()> {
        let seq = self.storage.next_stock_log_sequence(txn)?;
        let mut table = txn.open_table(STOCK_LOG_TABLE).map_err(StorageError::from)?;
        let value = serde_json::to_vec(entry).map_err(StorageError::from)?;
        table
            .insert(seq, value.as_slice())
            .map_err(StorageError::from)?;

        // Keep only the most recent `log_cap` entries
        while table.len().map_err(StorageError::from)? > self.log_cap as u64 {
            let oldest = table
                .first()
                .map_err(StorageError::from)?
                .map(|(k, _)| k.value());
            match oldest {
                Some(key) => {
                    table.remove(key).map_err(StorageError::from)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Most recent audit entries, newest first
    pub fn recent_log(&self, limit: usize) -> LedgerResult<Vec<StockLogEntry>> {
        let read_txn = self.storage.begin_read()?;
        let table = read_txn
            .open_table(STOCK_LOG_TABLE)
            .map_err(StorageError::from)?;
        let mut entries = Vec::new();
        for result in table.iter().map_err(StorageError::from)?.rev() {
            let (_key, value) = result.map_err(StorageError::from)?;
            entries.push(serde_json::from_slice(value.value()).map_err(StorageError::from)?);
            if entries.len() >= limit {
                break;
            }
        }
        Ok(entries)
    }
}
