//! Server configuration loaded from the environment

use std::path::PathBuf;

/// Runtime configuration, one env var per field with a sensible default
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the redb database file
    pub data_dir: String,
    pub log_level: String,
    /// Optional directory for rolling log files; stdout-only when unset
    pub log_dir: Option<String>,
    /// Display currency for new orders
    pub currency: String,
    /// ARS per USD, for derived USD prices
    pub ars_per_usd: f64,
    /// How many stock audit entries to retain
    pub stock_log_cap: usize,
    /// Recipient for low-stock alerts
    pub admin_email: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "ARS".into()),
            ars_per_usd: std::env::var("ARS_PER_USD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000.0),
            stock_log_cap: std::env::var("STOCK_LOG_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::ledger::DEFAULT_STOCK_LOG_CAP),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@localhost".into()),
        }
    }

    /// Path of the database file inside the data directory
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("store.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
