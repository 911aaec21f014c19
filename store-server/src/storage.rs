//! redb-based persistence for the storefront core
//!
//! One addressable record per entity (order/product/coupon/promotion)
//! instead of one JSON document per collection: writers get per-store
//! exclusive transactions, readers get shared snapshots, and a
//! read-modify-write cycle for a single logical operation always happens
//! inside one write transaction. Commits are atomic — never torn.
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `orders` | order id | JSON `Order` |
//! | `archived_orders` | order id | JSON `Order` (stamped `archived_date`) |
//! | `products` | product id | JSON `Product` |
//! | `product_index` | product id | JSON `ProductSummary` |
//! | `coupons` | coupon id | JSON `Coupon` |
//! | `promotions` | promotion id | JSON `Promotion` |
//! | `stock_log` | sequence | JSON `StockLogEntry` (size-capped) |
//! | `counters` | string key | u64 (per-year order counter, log sequence) |

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{Coupon, Product, ProductSummary, Promotion};
use shared::order::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Active orders: key = order id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Archived orders: moved here by admin action, never hard-deleted from `orders`
const ARCHIVED_ORDERS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("archived_orders");

/// Full product records
const PRODUCTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("products");

/// Product summaries for listings, kept in sync with `products` on every write
const PRODUCT_INDEX_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("product_index");

/// Coupons keyed by id; code lookup scans (coupon counts are tiny)
const COUPONS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("coupons");

/// Automatic promotions
const PROMOTIONS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("promotions");

/// Append-only, size-capped stock adjustment audit log
pub(crate) const STOCK_LOG_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("stock_log");

/// Counters: per-year order sequence (`order_count:<year>`) and stock log sequence
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const STOCK_LOG_SEQ_KEY: &str = "stock_log_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storefront storage backed by redb
///
/// redb commits with `Durability::Immediate`: once `commit()` returns the
/// write is persistent, via copy-on-write with an atomic pointer swap, so
/// the file is always in a consistent state even across power loss.
#[derive(Clone)]
pub struct StoreStorage {
    db: Arc<Database>,
}

impl StoreStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ARCHIVED_ORDERS_TABLE)?;
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(PRODUCT_INDEX_TABLE)?;
            let _ = write_txn.open_table(COUPONS_TABLE)?;
            let _ = write_txn.open_table(PROMOTIONS_TABLE)?;
            let _ = write_txn.open_table(STOCK_LOG_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction (exclusive; redb serializes writers)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction (shared snapshot)
    pub fn begin_read(&self) -> StorageResult<redb::ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    // ========== Order Operations ==========

    /// Store an order (within transaction)
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by id (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id (within transaction, for read-modify-write)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove an order from the active collection (within transaction)
    pub fn remove_order(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Find an order by customer-facing tracking token (read-only)
    pub fn find_order_by_token(&self, token: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.tracking_token == token {
                return Ok(Some(order));
            }
        }
        Ok(None)
    }

    /// Get all active orders
    pub fn get_all_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    // ========== Archived Order Operations ==========

    /// Store an order in the archive (within transaction)
    pub fn store_archived_order(
        &self,
        txn: &WriteTransaction,
        order: &Order,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ARCHIVED_ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an archived order (within transaction)
    pub fn get_archived_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ARCHIVED_ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove an order from the archive (within transaction)
    pub fn remove_archived_order(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ARCHIVED_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Get all archived orders
    pub fn get_all_archived_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ARCHIVED_ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    // ========== Product Operations ==========

    /// Store a product and its listing summary in the same transaction.
    ///
    /// Invariant: whenever a full product record changes in a field also
    /// present in the summary, the summary is updated in the same operation.
    /// This is the only product write path, so the two can never diverge.
    pub fn store_product(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id, value.as_slice())?;
        }
        let mut index = txn.open_table(PRODUCT_INDEX_TABLE)?;
        let summary = serde_json::to_vec(&product.summary())?;
        index.insert(product.id, summary.as_slice())?;
        Ok(())
    }

    /// Get a product by id (read-only)
    pub fn get_product(&self, product_id: i64) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a product by id (within transaction)
    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: i64,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a product and its summary (within transaction)
    pub fn remove_product(&self, txn: &WriteTransaction, product_id: i64) -> StorageResult<()> {
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            table.remove(product_id)?;
        }
        let mut index = txn.open_table(PRODUCT_INDEX_TABLE)?;
        index.remove(product_id)?;
        Ok(())
    }

    /// Get all product listing summaries, sorted by display order
    pub fn get_product_summaries(&self) -> StorageResult<Vec<ProductSummary>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCT_INDEX_TABLE)?;
        let mut summaries: Vec<ProductSummary> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            summaries.push(serde_json::from_slice(value.value())?);
        }
        summaries.sort_by_key(|s| s.sort_order);
        Ok(summaries)
    }

    /// Get all full product records
    pub fn get_all_products(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    // ========== Coupon Operations ==========

    /// Store a coupon (within transaction)
    pub fn store_coupon(&self, txn: &WriteTransaction, coupon: &Coupon) -> StorageResult<()> {
        let mut table = txn.open_table(COUPONS_TABLE)?;
        let value = serde_json::to_vec(coupon)?;
        table.insert(coupon.id, value.as_slice())?;
        Ok(())
    }

    /// Get a coupon by id (within transaction)
    pub fn get_coupon_txn(
        &self,
        txn: &WriteTransaction,
        coupon_id: i64,
    ) -> StorageResult<Option<Coupon>> {
        let table = txn.open_table(COUPONS_TABLE)?;
        match table.get(coupon_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Find a coupon by code, case-insensitive exact match (read-only)
    pub fn find_coupon_by_code(&self, code: &str) -> StorageResult<Option<Coupon>> {
        let needle = code.trim().to_uppercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUPONS_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            let coupon: Coupon = serde_json::from_slice(value.value())?;
            if coupon.code.to_uppercase() == needle {
                return Ok(Some(coupon));
            }
        }
        Ok(None)
    }

    /// Remove a coupon (within transaction)
    pub fn remove_coupon(&self, txn: &WriteTransaction, coupon_id: i64) -> StorageResult<()> {
        let mut table = txn.open_table(COUPONS_TABLE)?;
        table.remove(coupon_id)?;
        Ok(())
    }

    /// Get all coupons
    pub fn get_all_coupons(&self) -> StorageResult<Vec<Coupon>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUPONS_TABLE)?;
        let mut coupons = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            coupons.push(serde_json::from_slice(value.value())?);
        }
        Ok(coupons)
    }

    // ========== Promotion Operations ==========

    /// Store a promotion (within transaction)
    pub fn store_promotion(
        &self,
        txn: &WriteTransaction,
        promotion: &Promotion,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROMOTIONS_TABLE)?;
        let value = serde_json::to_vec(promotion)?;
        table.insert(promotion.id, value.as_slice())?;
        Ok(())
    }

    /// Get a promotion by id (within transaction)
    pub fn get_promotion_txn(
        &self,
        txn: &WriteTransaction,
        promotion_id: i64,
    ) -> StorageResult<Option<Promotion>> {
        let table = txn.open_table(PROMOTIONS_TABLE)?;
        match table.get(promotion_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a promotion (within transaction)
    pub fn remove_promotion(&self, txn: &WriteTransaction, promotion_id: i64) -> StorageResult<()> {
        let mut table = txn.open_table(PROMOTIONS_TABLE)?;
        table.remove(promotion_id)?;
        Ok(())
    }

    /// Get all promotions
    pub fn get_all_promotions(&self) -> StorageResult<Vec<Promotion>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROMOTIONS_TABLE)?;
        let mut promotions = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            promotions.push(serde_json::from_slice(value.value())?);
        }
        Ok(promotions)
    }

    // ========== Counters ==========

    /// Allocate the next per-year order sequence number (within transaction).
    ///
    /// The counter is incremented inside the order-creating transaction, so
    /// sequential creation yields strictly increasing numbers and a crashed
    /// creation never consumes a number.
    pub fn next_order_sequence(&self, txn: &WriteTransaction, year: i32) -> StorageResult<u64> {
        let key = format!("order_count:{}", year);
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key.as_str(), next)?;
        Ok(next)
    }

    /// Current order count for a year (without incrementing)
    pub fn order_count_for_year(&self, year: i32) -> StorageResult<u64> {
        let key = format!("order_count:{}", year);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0))
    }

    /// Allocate the next stock-log sequence number (within transaction)
    pub fn next_stock_log_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(STOCK_LOG_SEQ_KEY)?
            .map(|g| g.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(STOCK_LOG_SEQ_KEY, next)?;
        Ok(next)
    }
}
