//! Money calculation utilities using rust_decimal for precision
//!
//! Monetary values are stored as `f64`, but every computation routes
//! through `Decimal` and rounds half-up to 2 decimal places before
//! conversion back. Caller-supplied amounts are validated for finiteness
//! and range before they reach storage.

use rust_decimal::prelude::*;
use thiserror::Error;

/// A caller-supplied amount failed validation
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct AmountError(String);

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item
const MAX_PRICE: f64 = 100_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i64 = 9999;

/// Convert f64 to Decimal (zero on non-finite input)
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal back to f64, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round an f64 amount to 2 decimal places via Decimal
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// `subtotal * percent / 100`, rounded
pub fn percentage_of(subtotal: f64, percent: f64) -> f64 {
    to_f64(to_decimal(subtotal) * to_decimal(percent) / Decimal::from(100))
}

/// Clamp a fixed discount to the amount it applies against.
///
/// Applied uniformly to coupon and promotion fixed discounts: a discount
/// can never exceed the eligible subtotal.
pub fn clamp_discount(discount: f64, eligible_subtotal: f64) -> f64 {
    to_f64(to_decimal(discount).min(to_decimal(eligible_subtotal)).max(Decimal::ZERO))
}

/// `unit_price * quantity`, rounded
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Sum a list of amounts precisely
pub fn sum(amounts: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(amounts.into_iter().map(to_decimal).sum::<Decimal>())
}

/// `max(0, subtotal − discounts) + shipping`
///
/// The discounted subtotal clamps at zero; shipping is always charged in
/// full, so the total can never go negative.
pub fn order_total(subtotal: f64, discount_promotion: f64, discount_coupon: f64, shipping: f64) -> f64 {
    let discounted = (to_decimal(subtotal) - to_decimal(discount_promotion)
        - to_decimal(discount_coupon))
    .max(Decimal::ZERO);
    to_f64(discounted + to_decimal(shipping))
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), AmountError> {
    if !value.is_finite() {
        return Err(AmountError(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a caller-supplied monetary amount (finite, non-negative, bounded)
pub fn validate_amount(value: f64, field_name: &str) -> Result<(), AmountError> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(AmountError(format!(
            "{} must be non-negative, got {}",
            field_name, value
        )));
    }
    if value > MAX_PRICE {
        return Err(AmountError(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_PRICE, value
        )));
    }
    Ok(())
}

/// Validate a line quantity (positive, bounded)
pub fn validate_quantity(quantity: i64) -> Result<(), AmountError> {
    if quantity <= 0 {
        return Err(AmountError(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AmountError(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}
