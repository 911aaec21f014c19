//! store-server bootstrap: open the database and report store health.
//!
//! The transport layer (HTTP admin panel, gateway webhook endpoint) is
//! wired on top of the managers built here.

use std::sync::Arc;

use anyhow::Context;

use store_server::catalog::CatalogManager;
use store_server::config::Config;
use store_server::ledger::InventoryLedger;
use store_server::lifecycle::OrderLifecycle;
use store_server::notify::{LogSink, Notifier};
use store_server::reconcile::PaymentReconciler;
use store_server::storage::StoreStorage;
use store_server::utils::logger;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data dir {}", config.data_dir))?;
    let storage = StoreStorage::open(config.db_path())
        .with_context(|| format!("opening database at {}", config.db_path().display()))?;

    let ledger = InventoryLedger::new(storage.clone(), config.stock_log_cap);
    let lifecycle = OrderLifecycle::new(storage.clone(), ledger.clone(), config.currency.clone());
    let catalog = CatalogManager::new(storage.clone());
    let notifier = Notifier::new(Arc::new(LogSink), config.admin_email.clone());
    let _reconciler = PaymentReconciler::new(lifecycle.clone(), notifier);

    let orders = lifecycle.list_orders()?;
    let archived = lifecycle.list_archived_orders()?;
    let products = catalog.list_products()?;
    let low_stock = products
        .iter()
        .filter(|p| p.is_active && p.stock <= p.stock_alert)
        .count();

    tracing::info!(
        db = %config.db_path().display(),
        orders = orders.len(),
        archived = archived.len(),
        products = products.len(),
        low_stock,
        coupons = catalog.list_coupons()?.len(),
        promotions = catalog.list_promotions()?.len(),
        "Store ready"
    );
    Ok(())
}
