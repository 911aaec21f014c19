//! Catalog administration: products, coupons, promotions
//!
//! Admin CRUD over the catalog entities. Product stock is deliberately
//! absent from `ProductUpdate`: stock only moves through the inventory
//! ledger, so a product edit can never silently bypass the audit log.

use thiserror::Error;

use crate::money::{self, AmountError};
use crate::storage::{StorageError, StoreStorage};
use shared::models::discount::ProductScope;
use shared::models::{
    Coupon, CouponCreate, CouponUpdate, Product, ProductCreate, ProductSummary, ProductUpdate,
    Promotion, PromotionCondition, PromotionCreate, PromotionUpdate,
};
use shared::util::{now_millis, snowflake_id};

const DEFAULT_STOCK_ALERT: i64 = 3;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Coupon not found: {0}")]
    CouponNotFound(i64),

    #[error("Promotion not found: {0}")]
    PromotionNotFound(i64),

    #[error("Coupon code already exists: {0}")]
    DuplicateCouponCode(String),

    #[error("Initial stock must be non-negative, got {0}")]
    NegativeStock(i64),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog admin operations
#[derive(Clone)]
pub struct CatalogManager {
    storage: StoreStorage,
}

impl CatalogManager {
    pub fn new(storage: StoreStorage) -> Self {
        Self { storage }
    }

    // ========== Products ==========

    pub fn create_product(&self, payload: ProductCreate) -> CatalogResult<Product> {
        money::validate_amount(payload.price_ars, "price_ars")?;
        if let Some(usd) = payload.price_usd {
            money::validate_amount(usd, "price_usd")?;
        }
        if payload.stock < 0 {
            return Err(CatalogError::NegativeStock(payload.stock));
        }

        let now = now_millis();
        let product = Product {
            id: snowflake_id(),
            name: payload.name,
            description: payload.description,
            price_ars: payload.price_ars,
            price_usd: payload.price_usd,
            stock: payload.stock,
            stock_alert: payload.stock_alert.unwrap_or(DEFAULT_STOCK_ALERT),
            image: payload.image,
            sort_order: payload.sort_order.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        self.storage.store_product(&txn, &product)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(product_id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Apply a partial update. Stock is not touched here.
    pub fn update_product(&self, product_id: i64, payload: ProductUpdate) -> CatalogResult<Product> {
        if let Some(price) = payload.price_ars {
            money::validate_amount(price, "price_ars")?;
        }
        if let Some(usd) = payload.price_usd {
            money::validate_amount(usd, "price_usd")?;
        }

        let txn = self.storage.begin_write()?;
        let mut product = self
            .storage
            .get_product_txn(&txn, product_id)?
            .ok_or(CatalogError::ProductNotFound(product_id))?;

        if let Some(name) = payload.name {
            product.name = name;
        }
        if let Some(description) = payload.description {
            product.description = Some(description);
        }
        if let Some(price) = payload.price_ars {
            product.price_ars = price;
        }
        if let Some(usd) = payload.price_usd {
            product.price_usd = Some(usd);
        }
        if let Some(alert) = payload.stock_alert {
            product.stock_alert = alert;
        }
        if let Some(image) = payload.image {
            product.image = Some(image);
        }
        if let Some(sort_order) = payload.sort_order {
            product.sort_order = sort_order;
        }
        if let Some(is_active) = payload.is_active {
            product.is_active = is_active;
        }
        product.updated_at = now_millis();

        self.storage.store_product(&txn, &product)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(product)
    }

    pub fn delete_product(&self, product_id: i64) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage
            .get_product_txn(&txn, product_id)?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        self.storage.remove_product(&txn, product_id)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(product_id, "Product deleted");
        Ok(())
    }

    pub fn list_products(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.storage.get_all_products()?)
    }

    /// Storefront listing view
    pub fn list_summaries(&self) -> CatalogResult<Vec<ProductSummary>> {
        Ok(self.storage.get_product_summaries()?)
    }

    // ========== Coupons ==========

    pub fn create_coupon(&self, payload: CouponCreate) -> CatalogResult<Coupon> {
        money::validate_amount(payload.value, "value")?;
        let code = payload.code.trim().to_uppercase();
        if self.storage.find_coupon_by_code(&code)?.is_some() {
            return Err(CatalogError::DuplicateCouponCode(code));
        }

        let coupon = Coupon {
            id: snowflake_id(),
            code,
            discount_type: payload.discount_type,
            value: payload.value,
            min_purchase: payload.min_purchase.unwrap_or(0.0),
            max_uses: payload.max_uses.unwrap_or(0),
            uses_count: 0,
            valid_from: payload.valid_from,
            valid_until: payload.valid_until,
            applies_to: payload.applies_to.unwrap_or(ProductScope::All),
            combinable: payload.combinable.unwrap_or(false),
            is_active: true,
            created_at: now_millis(),
        };

        let txn = self.storage.begin_write()?;
        self.storage.store_coupon(&txn, &coupon)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(coupon_id = coupon.id, code = %coupon.code, "Coupon created");
        Ok(coupon)
    }

    /// Partial update. `uses_count` is never writable from here.
    pub fn update_coupon(&self, coupon_id: i64, payload: CouponUpdate) -> CatalogResult<Coupon> {
        if let Some(value) = payload.value {
            money::validate_amount(value, "value")?;
        }

        let txn = self.storage.begin_write()?;
        let mut coupon = self
            .storage
            .get_coupon_txn(&txn, coupon_id)?
            .ok_or(CatalogError::CouponNotFound(coupon_id))?;

        if let Some(discount_type) = payload.discount_type {
            coupon.discount_type = discount_type;
        }
        if let Some(value) = payload.value {
            coupon.value = value;
        }
        if let Some(min_purchase) = payload.min_purchase {
            coupon.min_purchase = min_purchase;
        }
        if let Some(max_uses) = payload.max_uses {
            coupon.max_uses = max_uses;
        }
        if let Some(valid_from) = payload.valid_from {
            coupon.valid_from = Some(valid_from);
        }
        if let Some(valid_until) = payload.valid_until {
            coupon.valid_until = Some(valid_until);
        }
        if let Some(applies_to) = payload.applies_to {
            coupon.applies_to = applies_to;
        }
        if let Some(combinable) = payload.combinable {
            coupon.combinable = combinable;
        }
        if let Some(is_active) = payload.is_active {
            coupon.is_active = is_active;
        }

        self.storage.store_coupon(&txn, &coupon)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(coupon)
    }

    pub fn delete_coupon(&self, coupon_id: i64) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage
            .get_coupon_txn(&txn, coupon_id)?
            .ok_or(CatalogError::CouponNotFound(coupon_id))?;
        self.storage.remove_coupon(&txn, coupon_id)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn list_coupons(&self) -> CatalogResult<Vec<Coupon>> {
        Ok(self.storage.get_all_coupons()?)
    }

    // ========== Promotions ==========

    pub fn create_promotion(&self, payload: PromotionCreate) -> CatalogResult<Promotion> {
        money::validate_amount(payload.value, "value")?;

        let promotion = Promotion {
            id: snowflake_id(),
            name: payload.name,
            discount_type: payload.discount_type,
            value: payload.value,
            applies_to: payload.applies_to.unwrap_or(ProductScope::All),
            condition: payload.condition.unwrap_or(PromotionCondition::Always),
            valid_from: payload.valid_from,
            valid_until: payload.valid_until,
            is_active: true,
            created_at: now_millis(),
        };

        let txn = self.storage.begin_write()?;
        self.storage.store_promotion(&txn, &promotion)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(promotion_id = promotion.id, name = %promotion.name, "Promotion created");
        Ok(promotion)
    }

    pub fn update_promotion(
        &self,
        promotion_id: i64,
        payload: PromotionUpdate,
    ) -> CatalogResult<Promotion> {
        if let Some(value) = payload.value {
            money::validate_amount(value, "value")?;
        }

        let txn = self.storage.begin_write()?;
        let mut promotion = self
            .storage
            .get_promotion_txn(&txn, promotion_id)?
            .ok_or(CatalogError::PromotionNotFound(promotion_id))?;

        if let Some(name) = payload.name {
            promotion.name = name;
        }
        if let Some(discount_type) = payload.discount_type {
            promotion.discount_type = discount_type;
        }
        if let Some(value) = payload.value {
            promotion.value = value;
        }
        if let Some(applies_to) = payload.applies_to {
            promotion.applies_to = applies_to;
        }
        if let Some(condition) = payload.condition {
            promotion.condition = condition;
        }
        if let Some(valid_from) = payload.valid_from {
            promotion.valid_from = Some(valid_from);
        }
        if let Some(valid_until) = payload.valid_until {
            promotion.valid_until = Some(valid_until);
        }
        if let Some(is_active) = payload.is_active {
            promotion.is_active = is_active;
        }

        self.storage.store_promotion(&txn, &promotion)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(promotion)
    }

    pub fn delete_promotion(&self, promotion_id: i64) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage
            .get_promotion_txn(&txn, promotion_id)?
            .ok_or(CatalogError::PromotionNotFound(promotion_id))?;
        self.storage.remove_promotion(&txn, promotion_id)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn list_promotions(&self) -> CatalogResult<Vec<Promotion>> {
        Ok(self.storage.get_all_promotions()?)
    }
}
