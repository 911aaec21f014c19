//! Coupon Model

use serde::{Deserialize, Serialize};

use super::discount::{DiscountType, ProductScope};

/// Customer-entered discount code
///
/// Codes are stored uppercase; lookup is case-insensitive exact match.
/// `max_uses = 0` means unlimited. `uses_count` is monotonic and is
/// incremented exactly once per confirmed order that redeemed the coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage (30 = 30%) or fixed amount depending on `discount_type`
    pub value: f64,
    /// Minimum subtotal required for the coupon to apply
    pub min_purchase: f64,
    /// 0 = unlimited
    pub max_uses: u32,
    pub uses_count: u32,
    /// Validity window start (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<i64>,
    /// Validity window end (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<i64>,
    pub applies_to: ProductScope,
    /// Whether the coupon stacks with automatic promotions
    pub combinable: bool,
    pub is_active: bool,
    pub created_at: i64,
}

impl Coupon {
    /// Check `now` against the optional validity window
    pub fn is_within_window(&self, now: i64) -> bool {
        if let Some(from) = self.valid_from
            && now < from
        {
            return false;
        }
        if let Some(until) = self.valid_until
            && now > until
        {
            return false;
        }
        true
    }

    /// Usage cap reached (never true when max_uses = 0)
    pub fn is_exhausted(&self) -> bool {
        self.max_uses > 0 && self.uses_count >= self.max_uses
    }
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreate {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub min_purchase: Option<f64>,
    pub max_uses: Option<u32>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub applies_to: Option<ProductScope>,
    pub combinable: Option<bool>,
}

/// Update coupon payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponUpdate {
    pub discount_type: Option<DiscountType>,
    pub value: Option<f64>,
    pub min_purchase: Option<f64>,
    pub max_uses: Option<u32>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub applies_to: Option<ProductScope>,
    pub combinable: Option<bool>,
    pub is_active: Option<bool>,
}
