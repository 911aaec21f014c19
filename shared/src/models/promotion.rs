//! Promotion Model

use serde::{Deserialize, Serialize};

use super::discount::{DiscountType, ProductScope};

/// Trigger condition for an automatic promotion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "condition", content = "minimum_amount", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionCondition {
    Always,
    MinSubtotal(f64),
}

impl PromotionCondition {
    pub fn holds(&self, subtotal: f64) -> bool {
        match self {
            PromotionCondition::Always => true,
            PromotionCondition::MinSubtotal(min) => subtotal >= *min,
        }
    }
}

/// Automatic (code-less) discount
///
/// Validity is permanent when both window bounds are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: i64,
    pub name: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub applies_to: ProductScope,
    pub condition: PromotionCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

impl Promotion {
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
}

/// Create promotion payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionCreate {
    pub name: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub applies_to: Option<ProductScope>,
    pub condition: Option<PromotionCondition>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
}

/// Update promotion payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromotionUpdate {
    pub name: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub value: Option<f64>,
    pub applies_to: Option<ProductScope>,
    pub condition: Option<PromotionCondition>,
    pub valid_from: Option<i64>,
    pub valid_until: Option<i64>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_always_holds() {
        assert!(PromotionCondition::Always.holds(0.0));
    }

    #[test]
    fn test_condition_min_subtotal() {
        let cond = PromotionCondition::MinSubtotal(100.0);
        assert!(!cond.holds(99.99));
        assert!(cond.holds(100.0));
    }
}
