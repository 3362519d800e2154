use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::{AppError, Result};

/// Minor units per major currency unit (cents per rupiah/dollar)
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a major-unit decimal amount ("12.50") into minor units (1250).
///
/// Multiplies by 100 and truncates toward zero. This conversion happens once,
/// at the request boundary; all arithmetic after it is integer-only.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "Amount must be non-negative, got: {}",
            amount
        )));
    }

    (amount * Decimal::from(MINOR_UNITS_PER_MAJOR))
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::validation(format!("Amount out of range: {}", amount)))
}

/// Convert minor units back into a major-unit decimal for responses.
///
/// Always carries two decimal places (1250 -> "12.50"). Negative inputs are
/// allowed: adjustments totals can be negative.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
