//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `price_ars` is the authoritative price; `price_usd` is either stored
/// explicitly or derived from the configured exchange rate at display time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Authoritative price (ARS)
    pub price_ars: f64,
    /// Stored USD price; `None` means derive from exchange rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    /// Current stock; must remain >= 0 at all times
    pub stock: i64,
    /// Low-stock notification threshold
    pub stock_alert: i64,
    pub image: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Listing representation, kept in sync with the full record by every
    /// mutation (same write transaction).
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price_ars: self.price_ars,
            price_usd: self.price_usd,
            stock: self.stock,
            sort_order: self.sort_order,
            is_active: self.is_active,
        }
    }

    /// USD price: stored value wins, otherwise derived from the rate
    pub fn price_usd_or(&self, ars_per_usd: f64) -> f64 {
        match self.price_usd {
            Some(usd) => usd,
            None if ars_per_usd > 0.0 => self.price_ars / ars_per_usd,
            None => 0.0,
        }
    }
}

/// Product listing entry (summary representation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub price_ars: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    pub stock: i64,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price_ars: f64,
    pub price_usd: Option<f64>,
    pub stock: i64,
    pub stock_alert: Option<i64>,
    pub image: Option<String>,
    pub sort_order: Option<i32>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_ars: Option<f64>,
    pub price_usd: Option<f64>,
    pub stock_alert: Option<i64>,
    pub image: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
