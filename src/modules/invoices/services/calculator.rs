// Invoice total calculation.
//
// Pure and stateless: totals are derived from the supplied items,
// adjustments, and tax rate with integer arithmetic in minor units. The only
// decimal operation is the tax term, which truncates via floor — a policy,
// not an accident of rounding.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{AdjustmentInput, ItemInput};

/// Derived monetary fields of an invoice, all in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: i64,
    pub tax_amount: i64,
    pub adjustments_total: i64,
    pub total: i64,
}

/// Compute all derived monetary fields for an invoice.
///
/// * `subtotal = sum(quantity x unit_price)`
/// * `adjustments_total = sum(additions) - sum(deductions)`
/// * `tax_amount = floor(subtotal x tax_rate / 100)`
/// * `total = subtotal + tax_amount + adjustments_total`
pub fn compute_totals(
    items: &[ItemInput],
    adjustments: &[AdjustmentInput],
    tax_rate: Decimal,
) -> Result<InvoiceTotals> {
    validate_tax_rate(tax_rate)?;

    let mut subtotal: i64 = 0;
    for item in items {
        let line = i64::from(item.quantity)
            .checked_mul(item.unit_price)
            .ok_or_else(|| AppError::validation("Line item amount out of range"))?;
        subtotal = subtotal
            .checked_add(line)
            .ok_or_else(|| AppError::validation("Invoice subtotal out of range"))?;
    }

    let mut adjustments_total: i64 = 0;
    for adjustment in adjustments {
        adjustments_total = adjustments_total
            .checked_add(adjustment.signed_amount())
            .ok_or_else(|| AppError::validation("Adjustments total out of range"))?;
    }

    let tax_amount = compute_tax(subtotal, tax_rate)?;

    let total = subtotal
        .checked_add(tax_amount)
        .and_then(|t| t.checked_add(adjustments_total))
        .ok_or_else(|| AppError::validation("Invoice total out of range"))?;

    Ok(InvoiceTotals {
        subtotal,
        tax_amount,
        adjustments_total,
        total,
    })
}

/// Tax on a subtotal: floor(subtotal x tax_rate / 100), truncating
pub fn compute_tax(subtotal: i64, tax_rate: Decimal) -> Result<i64> {
    validate_tax_rate(tax_rate)?;

    (Decimal::from(subtotal) * tax_rate / Decimal::from(100))
        .floor()
        .to_i64()
        .ok_or_else(|| AppError::validation("Tax amount out of range"))
}

/// Tax rate is a non-negative percentage (10 = 10%)
pub fn validate_tax_rate(tax_rate: Decimal) -> Result<()> {
    if tax_rate < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "Tax rate cannot be negative, got: {}",
            tax_rate
        )));
    }

    Ok(())
}
