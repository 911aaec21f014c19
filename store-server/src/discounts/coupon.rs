//! Coupon validation and discount computation
//!
//! Validation runs a fixed sequence of checks and reports the first
//! failure with a customer-facing message (Spanish, shown verbatim in the
//! storefront UI). Discounts are computed over the subtotal of the lines
//! the coupon's scope covers.

use thiserror::Error;

use crate::money;
use shared::models::{Coupon, DiscountType};
use shared::order::LineItem;

/// Why a coupon code was rejected. Messages are shown to the customer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CouponRejection {
    #[error("cupón no encontrado")]
    NotFound,

    #[error("cupón inactivo")]
    Inactive,

    #[error("cupón fuera de vigencia")]
    OutsideWindow,

    #[error("compra mínima no alcanzada: se requieren ${0:.2}")]
    MinPurchaseNotMet(f64),

    #[error("cupón agotado")]
    Exhausted,

    #[error("cupón no aplicable a los productos del pedido")]
    NotApplicable,
}

/// Subtotal of the lines a scope covers
pub(crate) fn eligible_subtotal(
    scope: &shared::models::ProductScope,
    items: &[LineItem],
) -> f64 {
    money::sum(
        items
            .iter()
            .filter(|line| scope.matches(line.product_id))
            .map(|line| line.line_total),
    )
}

/// Validate a coupon against a cart.
///
/// Checks run in order and the first failure wins: active → validity
/// window → minimum purchase (against the full subtotal) → usage cap →
/// scope coverage. The caller maps a failed code lookup to `NotFound`
/// before reaching this function.
pub fn validate_coupon(
    coupon: &Coupon,
    items: &[LineItem],
    subtotal: f64,
    now: i64,
) -> Result<(), CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if !coupon.is_within_window(now) {
        return Err(CouponRejection::OutsideWindow);
    }
    if subtotal < coupon.min_purchase {
        return Err(CouponRejection::MinPurchaseNotMet(coupon.min_purchase));
    }
    if coupon.is_exhausted() {
        return Err(CouponRejection::Exhausted);
    }
    if eligible_subtotal(&coupon.applies_to, items) <= 0.0 {
        return Err(CouponRejection::NotApplicable);
    }
    Ok(())
}

/// Discount amount for a validated coupon.
///
/// Percentage coupons apply over the eligible-lines subtotal; fixed
/// coupons are clamped so they never exceed it.
pub fn coupon_discount(coupon: &Coupon, items: &[LineItem]) -> f64 {
    let eligible = eligible_subtotal(&coupon.applies_to, items);
    match coupon.discount_type {
        DiscountType::Percentage => money::percentage_of(eligible, coupon.value),
        DiscountType::Fixed => money::clamp_discount(coupon.value, eligible),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::discount::ProductScope;
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

    fn base_coupon() -> Coupon {
        Coupon {
            id: 1,
            code: "VERANO".to_string(),
            discount_type: DiscountType::Percentage,
            value: 15.0,
            min_purchase: 0.0,
            max_uses: 0,
            uses_count: 0,
            valid_from: None,
            valid_until: None,
            applies_to: ProductScope::All,
            combinable: true,
            is_active: true,
            created_at: now_millis(),
        }
    }

    #[test]
    fn test_check_order_first_failure_wins() {
        let items = vec![item(1, 10.0, 1)];
        let now = now_millis();

        // Inactive outranks everything else
        let mut c = base_coupon();
        c.is_active = false;
        c.max_uses = 1;
        c.uses_count = 1;
        assert_eq!(
            validate_coupon(&c, &items, 10.0, now),
            Err(CouponRejection::Inactive)
        );

        // Window outranks min purchase and exhaustion
        let mut c = base_coupon();
        c.valid_until = Some(now - 1000);
        c.min_purchase = 100.0;
        assert_eq!(
            validate_coupon(&c, &items, 10.0, now),
            Err(CouponRejection::OutsideWindow)
        );

        // Min purchase outranks exhaustion
        let mut c = base_coupon();
        c.min_purchase = 100.0;
        c.max_uses = 1;
        c.uses_count = 1;
        assert_eq!(
            validate_coupon(&c, &items, 10.0, now),
            Err(CouponRejection::MinPurchaseNotMet(100.0))
        );
    }

    #[test]
    fn test_exhausted_coupon() {
        let mut c = base_coupon();
        c.max_uses = 3;
        c.uses_count = 3;
        assert_eq!(
            validate_coupon(&c, &[item(1, 10.0, 1)], 10.0, now_millis()),
            Err(CouponRejection::Exhausted)
        );

        // max_uses = 0 means unlimited
        let mut c = base_coupon();
        c.max_uses = 0;
        c.uses_count = 9999;
        assert!(validate_coupon(&c, &[item(1, 10.0, 1)], 10.0, now_millis()).is_ok());
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let now = now_millis();
        let mut c = base_coupon();
        c.valid_from = Some(now);
        c.valid_until = Some(now);
        assert!(validate_coupon(&c, &[item(1, 10.0, 1)], 10.0, now).is_ok());
        assert_eq!(
            validate_coupon(&c, &[item(1, 10.0, 1)], 10.0, now + 1),
            Err(CouponRejection::OutsideWindow)
        );
    }

    #[test]
    fn test_scoped_coupon_discounts_only_eligible_lines() {
        let mut c = base_coupon();
        c.applies_to = ProductScope::Products(vec![1]);
        let items = vec![item(1, 100.0, 1), item(2, 500.0, 1)];
        // 15% of the eligible line only
        assert_eq!(coupon_discount(&c, &items), 15.0);
    }

    #[test]
    fn test_scoped_coupon_with_no_eligible_lines_rejected() {
        let mut c = base_coupon();
        c.applies_to = ProductScope::Products(vec![7]);
        let items = vec![item(1, 100.0, 1)];
        assert_eq!(
            validate_coupon(&c, &items, 100.0, now_millis()),
            Err(CouponRejection::NotApplicable)
        );
    }

    #[test]
    fn test_fixed_coupon_clamped_to_eligible_subtotal() {
        let mut c = base_coupon();
        c.discount_type = DiscountType::Fixed;
        c.value = 500.0;
        let items = vec![item(1, 120.0, 1)];
        assert_eq!(coupon_discount(&c, &items), 120.0);
    }

    #[test]
    fn test_rejection_messages_are_customer_facing() {
        assert_eq!(CouponRejection::Exhausted.to_string(), "cupón agotado");
        assert_eq!(CouponRejection::NotFound.to_string(), "cupón no encontrado");
        assert_eq!(
            CouponRejection::MinPurchaseNotMet(50.0).to_string(),
            "compra mínima no alcanzada: se requieren $50.00"
        );
    }
}
