//! Bill amount aggregation
//!
//! Computes subtotal, tax, and total for a set of line items. Inputs are
//! trusted: no validation is performed and no error conditions exist.
//! Negative quantities or prices flow straight through the arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A single bill line. Ephemeral: constructed per calculation call and
/// never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub sort_order: Option<i32>,
}

/// A tax applied against the aggregate subtotal (not per line).
/// Multiple tax lines are additive, not compounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxLine {
    pub tax_name: String,
    pub tax_percentage: Decimal,
    pub tax_type: Option<String>,
}

/// Computed bill amounts, each rounded to exactly 2 fraction digits.
/// Invariant: `total == subtotal + tax_amount` at 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountSummary {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Round a monetary value to 2 decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute subtotal, tax amount, and total for a bill.
///
/// Tax contributions are computed from the unrounded subtotal; only the
/// final subtotal, tax amount, and total are rounded. Empty line items
/// and empty taxes are both valid and yield zeros.
pub fn calculate_bill_amounts(line_items: &[LineItem], taxes: &[TaxLine]) -> AmountSummary {
    let raw_subtotal: Decimal = line_items
        .iter()
        .map(|item| item.quantity * item.unit_price)
        .sum();

    let raw_tax: Decimal = taxes
        .iter()
        .map(|tax| raw_subtotal * tax.tax_percentage / Decimal::ONE_HUNDRED)
        .sum();

    let subtotal = round_money(raw_subtotal);
    let tax_amount = round_money(raw_tax);

    AmountSummary {
        subtotal,
        tax_amount,
        total: round_money(subtotal + tax_amount),
    }
}
