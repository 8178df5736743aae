//! Deterministic money rounding pipeline
//!
//! Every recipe prices a line item through the same four steps:
//! gross (10dp) -> subtotal (2dp) -> tax (2dp) -> net (2dp).
//! Half-away-from-zero at each step; re-running the pipeline on
//! already-rounded inputs yields identical output.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on the raw quantity x rate product
pub const GROSS_DP: u32 = 10;

/// Decimal places for all monetary amounts
pub const MONEY_DP: u32 = 2;

/// Round an intermediate gross amount to 10 decimal places
pub fn round_gross(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(GROSS_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a monetary amount to 2 decimal places
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Fully priced amounts for one line item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub gross: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
}

/// Price one line item: `discount` is an absolute amount subtracted from
/// the gross, `tax_rate` a percentage applied to the subtotal.
pub fn line_amounts(
    quantity: Decimal,
    rate: Decimal,
    discount: Decimal,
    tax_rate: Decimal,
) -> LineAmounts {
    let gross = round_gross(quantity * rate);
    let subtotal = round_money(gross - discount);
    let tax = round_money(subtotal * tax_rate / Decimal::ONE_HUNDRED);
    let net = round_money(subtotal + tax);

    LineAmounts {
        gross,
        subtotal,
        tax,
        net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_scenario_two_units_ten_percent() {
        // 2 units @ 100.00, tax 10%
        let amounts = line_amounts(dec!(2), dec!(100.00), Decimal::ZERO, dec!(10));

        assert_eq!(amounts.gross, dec!(200));
        assert_eq!(amounts.subtotal, dec!(200.00));
        assert_eq!(amounts.tax, dec!(20.00));
        assert_eq!(amounts.net, dec!(220.00));
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let first = line_amounts(dec!(3), dec!(9.995), dec!(1.25), dec!(7.5));
        let second = line_amounts(first.subtotal + dec!(1.25), dec!(1), dec!(1.25), dec!(7.5));

        // Feeding the rounded subtotal back through produces the same
        // subtotal/tax/net
        assert_eq!(second.subtotal, first.subtotal);
        assert_eq!(second.tax, first.tax);
        assert_eq!(second.net, first.net);
    }

    #[test]
    fn test_gross_keeps_ten_decimal_places() {
        // 1/3-ish rates survive to 10dp before the money rounding
        let gross = round_gross(dec!(1) * dec!(0.3333333333333));
        assert_eq!(gross, dec!(0.3333333333));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
    }

    #[test]
    fn test_discount_applies_before_tax() {
        // 1 @ 100.00, 20.00 discount, 10% tax on the discounted subtotal
        let amounts = line_amounts(dec!(1), dec!(100.00), dec!(20.00), dec!(10));

        assert_eq!(amounts.subtotal, dec!(80.00));
        assert_eq!(amounts.tax, dec!(8.00));
        assert_eq!(amounts.net, dec!(88.00));
    }
}
