// Property-based tests for invoice total calculation.
//
// Verifies the derivation invariants across a wide input range:
// subtotal = sum(quantity x unit_price), tax = floor(subtotal x rate / 100),
// total = subtotal + tax + adjustments, all in integer minor units.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use faktur::modules::invoices::models::{AdjustmentInput, AdjustmentKind, ItemInput};
use faktur::modules::invoices::services::calculator::{compute_tax, compute_totals};

fn item(quantity: i32, unit_price: i64) -> ItemInput {
    ItemInput::new("Item".to_string(), String::new(), quantity, unit_price).unwrap()
}

fn adjustment(kind: AdjustmentKind, amount: i64) -> AdjustmentInput {
    AdjustmentInput::new("Adjustment".to_string(), kind, amount).unwrap()
}

proptest! {
    /// subtotal is exactly the integer sum of quantity x unit_price
    #[test]
    fn test_subtotal_is_integer_sum(
        lines in prop::collection::vec((1i32..1000, 0i64..10_000_000), 0..8)
    ) {
        let items: Vec<ItemInput> = lines.iter().map(|(q, p)| item(*q, *p)).collect();
        let totals = compute_totals(&items, &[], dec!(0)).unwrap();

        let expected: i64 = lines.iter().map(|(q, p)| i64::from(*q) * p).sum();
        prop_assert_eq!(totals.subtotal, expected);
        prop_assert_eq!(totals.total, expected);
    }

    /// total = subtotal + tax + adjustments_total, exactly
    #[test]
    fn test_total_identity(
        lines in prop::collection::vec((1i32..100, 0i64..1_000_000), 1..5),
        additions in prop::collection::vec(0i64..1_000_000, 0..4),
        deductions in prop::collection::vec(0i64..1_000_000, 0..4),
        tax_rate_percent in 0u32..200u32,
    ) {
        let items: Vec<ItemInput> = lines.iter().map(|(q, p)| item(*q, *p)).collect();
        let adjustments: Vec<AdjustmentInput> = additions
            .iter()
            .map(|a| adjustment(AdjustmentKind::Addition, *a))
            .chain(deductions.iter().map(|d| adjustment(AdjustmentKind::Deduction, *d)))
            .collect();

        let totals = compute_totals(&items, &adjustments, Decimal::from(tax_rate_percent)).unwrap();

        let additions_sum: i64 = additions.iter().sum();
        let deductions_sum: i64 = deductions.iter().sum();
        prop_assert_eq!(totals.adjustments_total, additions_sum - deductions_sum);
        prop_assert_eq!(
            totals.total,
            totals.subtotal + totals.tax_amount + totals.adjustments_total
        );
    }

    /// tax = floor(subtotal x rate / 100), never rounded up
    #[test]
    fn test_tax_floor(subtotal in 0i64..1_000_000_000, rate_basis_points in 0u32..10_000u32) {
        let rate = Decimal::from(rate_basis_points) / dec!(100);
        let tax = compute_tax(subtotal, rate).unwrap();

        let exact = Decimal::from(subtotal) * rate / dec!(100);
        prop_assert!(Decimal::from(tax) <= exact);
        prop_assert!(exact - Decimal::from(tax) < dec!(1));
    }

    /// tax is monotonic non-decreasing in the subtotal
    #[test]
    fn test_tax_monotonic(
        a in 0i64..1_000_000_000,
        b in 0i64..1_000_000_000,
        rate_percent in 0u32..100u32,
    ) {
        let rate = Decimal::from(rate_percent);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(compute_tax(lo, rate).unwrap() <= compute_tax(hi, rate).unwrap());
    }

    /// Same inputs, same outputs
    #[test]
    fn test_deterministic(
        lines in prop::collection::vec((1i32..100, 0i64..1_000_000), 1..5),
        rate_percent in 0u32..100u32,
    ) {
        let items: Vec<ItemInput> = lines.iter().map(|(q, p)| item(*q, *p)).collect();
        let rate = Decimal::from(rate_percent);

        prop_assert_eq!(
            compute_totals(&items, &[], rate).unwrap(),
            compute_totals(&items, &[], rate).unwrap()
        );
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn test_two_items_ten_percent_tax() {
        // [{qty:2, price:10000}, {qty:1, price:5000}] at 10%
        let items = vec![item(2, 10000), item(1, 5000)];
        let totals = compute_totals(&items, &[], dec!(10)).unwrap();

        assert_eq!(totals.subtotal, 25000);
        assert_eq!(totals.tax_amount, 2500);
        assert_eq!(totals.adjustments_total, 0);
        assert_eq!(totals.total, 27500);
    }

    #[test]
    fn test_addition_and_deduction_no_tax() {
        let items = vec![item(1, 10000)];
        let adjustments = vec![
            adjustment(AdjustmentKind::Addition, 500),
            adjustment(AdjustmentKind::Deduction, 200),
        ];
        let totals = compute_totals(&items, &adjustments, dec!(0)).unwrap();

        assert_eq!(totals.subtotal, 10000);
        assert_eq!(totals.adjustments_total, 300);
        assert_eq!(totals.total, 10300);
    }

    #[test]
    fn test_fractional_tax_rate_truncates() {
        // 333 * 3% = 9.99 -> 9
        assert_eq!(compute_tax(333, dec!(3)).unwrap(), 9);
        // 999 * 12.5% = 124.875 -> 124
        assert_eq!(compute_tax(999, dec!(12.5)).unwrap(), 124);
    }

    #[test]
    fn test_empty_invoice() {
        let totals = compute_totals(&[], &[], dec!(10)).unwrap();
        assert_eq!(totals.subtotal, 0);
        assert_eq!(totals.tax_amount, 0);
        assert_eq!(totals.total, 0);
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(compute_tax(1000, dec!(-0.5)).is_err());
    }
}
