//! Automatic promotion selection
//!
//! Promotions are code-less: every active promotion whose window and
//! condition hold is a candidate, and the single one granting the largest
//! discount is applied. Promotions never stack with each other.

use crate::discounts::coupon::eligible_subtotal;
use crate::money;
use shared::models::{DiscountType, Promotion};
use shared::order::LineItem;

/// The promotion chosen for an order, with its computed amount
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromotion {
    pub promotion_id: i64,
    pub name: String,
    pub amount: f64,
}

/// Every active promotion whose window, condition and product scope hold
/// for this cart. Composition (which one to apply) is the caller's call.
pub fn applicable_promotions<'a>(
    promotions: &'a [Promotion],
    items: &[LineItem],
    subtotal: f64,
    now: i64,
) -> Vec<&'a Promotion> {
    promotions
        .iter()
        .filter(|p| {
            p.is_active
                && p.is_within_window(now)
                && p.condition.holds(subtotal)
                && eligible_subtotal(&p.applies_to, items) > 0.0
        })
        .collect()
}

/// Discount a single promotion would grant, if it applies at all
fn promotion_discount(
    promotion: &Promotion,
    items: &[LineItem],
    subtotal: f64,
    now: i64,
) -> Option<f64> {
    if !promotion.is_active
        || !promotion.is_within_window(now)
        || !promotion.condition.holds(subtotal)
    {
        return None;
    }
    let eligible = eligible_subtotal(&promotion.applies_to, items);
    if eligible <= 0.0 {
        return None;
    }
    let amount = match promotion.discount_type {
        DiscountType::Percentage => money::percentage_of(eligible, promotion.value),
        DiscountType::Fixed => money::clamp_discount(promotion.value, eligible),
    };
    (amount > 0.0).then_some(amount)
}

/// Pick the applicable promotion with the largest discount.
///
/// Ties break on lower id so the choice is deterministic across runs.
pub fn best_promotion(
    promotions: &[Promotion],
    items: &[LineItem],
    subtotal: f64,
    now: i64,
) -> Option<AppliedPromotion> {
    let mut best: Option<AppliedPromotion> = None;
    for promotion in promotions {
        let Some(amount) = promotion_discount(promotion, items, subtotal, now) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(current) => {
                amount > current.amount
                    || (amount == current.amount && promotion.id < current.promotion_id)
            }
        };
        if better {
            best = Some(AppliedPromotion {
                promotion_id: promotion.id,
                name: promotion.name.clone(),
                amount,
            });
        }
    }
    best
}
