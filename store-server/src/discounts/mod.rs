//! Discount evaluation: coupons (customer-entered codes) and promotions
//! (automatic rules)
//!
//! Evaluation is pure over an order's line items: callers look up the
//! coupon and promotion records, this module decides what applies and for
//! how much. Both discount amounts are computed independently against the
//! pre-discount subtotal of the eligible lines; the lifecycle layer clamps
//! the combined total at zero.

pub mod coupon;
pub mod promotion;

pub use coupon::{CouponRejection, coupon_discount, validate_coupon};
pub use promotion::{AppliedPromotion, applicable_promotions, best_promotion};

use shared::models::{Coupon, Promotion};
use shared::order::LineItem;

/// Result of evaluating a cart against a coupon and the promotion set
#[derive(Debug, Clone, Default)]
pub struct DiscountOutcome {
    pub discount_promotion: f64,
    pub discount_coupon: f64,
    pub coupon_code: Option<String>,
    pub promotion_name: Option<String>,
}

/// Evaluate both discount sources for a cart.
///
/// The coupon must already have passed `validate_coupon`. A non-combinable
/// coupon suppresses promotions entirely; otherwise the single best
/// applicable promotion stacks with the coupon.
pub fn evaluate(
    items: &[LineItem],
    subtotal: f64,
    coupon: Option<&Coupon>,
    promotions: &[Promotion],
    now: i64,
) -> DiscountOutcome {
    let mut outcome = DiscountOutcome::default();

    if let Some(coupon) = coupon {
        outcome.discount_coupon = coupon_discount(coupon, items);
        outcome.coupon_code = Some(coupon.code.clone());
        if !coupon.combinable {
            return outcome;
        }
    }

    if let Some(applied) = best_promotion(promotions, items, subtotal, now) {
        outcome.discount_promotion = applied.amount;
        outcome.promotion_name = Some(applied.name);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::discount::{DiscountType, ProductScope};
    use shared::models::promotion::PromotionCondition;
    use shared::util::now_millis;

    fn item(product_id: i64, unit_price: f64, quantity: i64) -> LineItem {
        LineItem {
            product_id,
            name: format!("Producto {}", product_id),
            quantity,
            unit_price,
            line_total: unit_price * quantity as f64,
        }
    }

    fn coupon(combinable: bool) -> Coupon {
        Coupon {
            id: 1,
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percentage,
            value: 10.0,
            min_purchase: 0.0,
            max_uses: 0,
            uses_count: 0,
            valid_from: None,
            valid_until: None,
            applies_to: ProductScope::All,
            combinable,
            is_active: true,
            created_at: now_millis(),
        }
    }

    fn promo() -> Promotion {
        Promotion {
            id: 2,
            name: "Promo fija".to_string(),
            discount_type: DiscountType::Fixed,
            value: 20.0,
            applies_to: ProductScope::All,
            condition: PromotionCondition::Always,
            valid_from: None,
            valid_until: None,
            is_active: true,
            created_at: now_millis(),
        }
    }

    #[test]
    fn test_combinable_coupon_stacks_with_promotion() {
        let items = vec![item(1, 100.0, 2)];
        let outcome = evaluate(&items, 200.0, Some(&coupon(true)), &[promo()], now_millis());
        assert_eq!(outcome.discount_coupon, 20.0);
        assert_eq!(outcome.discount_promotion, 20.0);
        assert_eq!(outcome.coupon_code.as_deref(), Some("SAVE10"));
    }

    #[test]
    fn test_non_combinable_coupon_suppresses_promotion() {
        let items = vec![item(1, 100.0, 2)];
        let outcome = evaluate(&items, 200.0, Some(&coupon(false)), &[promo()], now_millis());
        assert_eq!(outcome.discount_coupon, 20.0);
        assert_eq!(outcome.discount_promotion, 0.0);
        assert!(outcome.promotion_name.is_none());
    }

    #[test]
    fn test_promotion_alone() {
        let items = vec![item(1, 50.0, 1)];
        let outcome = evaluate(&items, 50.0, None, &[promo()], now_millis());
        assert_eq!(outcome.discount_coupon, 0.0);
        assert_eq!(outcome.discount_promotion, 20.0);
        assert_eq!(outcome.promotion_name.as_deref(), Some("Promo fija"));
    }
}
