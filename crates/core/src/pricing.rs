//! Quotation pricing engine. Pure arithmetic over catalog prices: no I/O,
//! exact `Decimal` results, formatting left to callers.
//!
//! Amounts are totaled in whatever currency each price is tagged with;
//! the engine performs no conversion via the exchange-rate log.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One requested line of a quotation: a machine code plus how many units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub machine_code: String,
    pub quantity: u32,
}

impl LineItem {
    /// Quantity is floored to 1 on construction; a zero-quantity line is
    /// treated as a single unit.
    pub fn new(machine_code: impl Into<String>, quantity: u32) -> Self {
        Self { machine_code: machine_code.into(), quantity: quantity.max(1) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub machine_code: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub lines: Vec<PricedLine>,
    pub grand_subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
}

/// Read-only unit-price resolution, normally backed by the catalog.
pub trait PriceLookup {
    fn unit_price(&self, machine_code: &str) -> Option<Decimal>;
}

impl<F> PriceLookup for F
where
    F: Fn(&str) -> Option<Decimal>,
{
    fn unit_price(&self, machine_code: &str) -> Option<Decimal> {
        self(machine_code)
    }
}

impl PriceLookup for std::collections::HashMap<String, Decimal> {
    fn unit_price(&self, machine_code: &str) -> Option<Decimal> {
        self.get(machine_code).copied()
    }
}

/// Clamp a discount percentage into [0, 100] so a bad input can never
/// produce a negative total.
pub fn clamp_discount(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, Decimal::from(100))
}

/// Price a set of line items under a single global discount.
///
/// Unknown codes resolve to a unit price of zero rather than failing; the
/// caller is expected to have validated codes, the engine stays defensive.
pub fn price(
    line_items: &[LineItem],
    discount_percent: Decimal,
    catalog: &impl PriceLookup,
) -> PriceBreakdown {
    let discount_percent = clamp_discount(discount_percent);

    let lines: Vec<PricedLine> = line_items
        .iter()
        .map(|item| {
            let quantity = item.quantity.max(1);
            let unit_price = catalog.unit_price(&item.machine_code).unwrap_or(Decimal::ZERO);
            PricedLine {
                machine_code: item.machine_code.clone(),
                quantity,
                unit_price,
                subtotal: unit_price * Decimal::from(quantity),
            }
        })
        .collect();

    let grand_subtotal: Decimal = lines.iter().map(|line| line.subtotal).sum();
    let discount_amount = grand_subtotal * discount_percent / Decimal::from(100);

    PriceBreakdown {
        lines,
        grand_subtotal,
        discount_percent,
        discount_amount,
        grand_total: grand_subtotal - discount_amount,
    }
}

/// Quotation-level totals: machines plus options, under the combined
/// client + additional discount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    pub original_price: Decimal,
    pub total_discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
}

/// The client (payment-condition) and additional ad-hoc discounts combine
/// additively, capped at 100%.
pub fn combined_discount(client_percent: Decimal, additional_percent: Decimal) -> Decimal {
    clamp_discount(clamp_discount(client_percent) + clamp_discount(additional_percent))
}

pub fn quote_totals(
    machines_subtotal: Decimal,
    options_total: Decimal,
    client_percent: Decimal,
    additional_percent: Decimal,
) -> QuoteTotals {
    let original_price = machines_subtotal + options_total;
    let total_discount_percent = combined_discount(client_percent, additional_percent);
    let discount_amount = original_price * total_discount_percent / Decimal::from(100);

    QuoteTotals {
        original_price,
        total_discount_percent,
        discount_amount,
        final_price: original_price - discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;

    use super::{combined_discount, price, quote_totals, LineItem};

    fn catalog() -> HashMap<String, Decimal> {
        HashMap::from([
            ("X1".to_string(), Decimal::from(1000)),
            ("X2".to_string(), Decimal::from(500)),
        ])
    }

    #[test]
    fn prices_multi_line_quote_with_discount() {
        let items = [LineItem::new("X1", 2), LineItem::new("X2", 1)];

        let breakdown = price(&items, Decimal::from(10), &catalog());

        assert_eq!(breakdown.grand_subtotal, Decimal::from(2500));
        assert_eq!(breakdown.discount_amount, Decimal::from(250));
        assert_eq!(breakdown.grand_total, Decimal::from(2250));
        assert_eq!(breakdown.lines[0].subtotal, Decimal::from(2000));
        assert_eq!(breakdown.lines[1].subtotal, Decimal::from(500));
    }

    #[test]
    fn grand_total_never_exceeds_subtotal() {
        let items = [LineItem::new("X1", 3)];
        for percent in [0i64, 15, 50, 100] {
            let breakdown = price(&items, Decimal::from(percent), &catalog());
            assert!(breakdown.grand_total <= breakdown.grand_subtotal);
            assert_eq!(
                breakdown.grand_total,
                breakdown.grand_subtotal - breakdown.discount_amount
            );
        }
    }

    #[test]
    fn discount_is_clamped_to_valid_range() {
        let items = [LineItem::new("X1", 1)];

        let over = price(&items, Decimal::from(150), &catalog());
        let full = price(&items, Decimal::from(100), &catalog());
        assert_eq!(over, full);
        assert_eq!(over.grand_total, Decimal::ZERO);

        let under = price(&items, Decimal::from(-10), &catalog());
        let none = price(&items, Decimal::ZERO, &catalog());
        assert_eq!(under, none);
        assert_eq!(under.grand_total, Decimal::from(1000));
    }

    #[test]
    fn zero_quantity_is_treated_as_one() {
        let raw = LineItem { machine_code: "X2".to_string(), quantity: 0 };

        let breakdown = price(&[raw], Decimal::ZERO, &catalog());

        assert_eq!(breakdown.lines[0].quantity, 1);
        assert_eq!(breakdown.grand_total, Decimal::from(500));
    }

    #[test]
    fn unknown_code_resolves_to_zero_instead_of_failing() {
        let items = [LineItem::new("GHOST", 4), LineItem::new("X2", 1)];

        let breakdown = price(&items, Decimal::ZERO, &catalog());

        assert_eq!(breakdown.lines[0].unit_price, Decimal::ZERO);
        assert_eq!(breakdown.grand_subtotal, Decimal::from(500));
    }

    #[test]
    fn closure_lookup_is_accepted() {
        let items = [LineItem::new("ANY", 2)];
        let breakdown =
            price(&items, Decimal::ZERO, &|_: &str| Some(Decimal::new(1050, 1)));
        assert_eq!(breakdown.grand_total, Decimal::from(210));
    }

    #[test]
    fn discounts_combine_additively_and_cap_at_hundred() {
        assert_eq!(
            combined_discount(Decimal::from(12), Decimal::from(5)),
            Decimal::from(17)
        );
        assert_eq!(
            combined_discount(Decimal::from(80), Decimal::from(40)),
            Decimal::from(100)
        );
    }

    #[test]
    fn quote_totals_apply_discount_to_machines_plus_options() {
        let totals = quote_totals(
            Decimal::from(2000),
            Decimal::from(500),
            Decimal::from(10),
            Decimal::from(10),
        );

        assert_eq!(totals.original_price, Decimal::from(2500));
        assert_eq!(totals.total_discount_percent, Decimal::from(20));
        assert_eq!(totals.discount_amount, Decimal::from(500));
        assert_eq!(totals.final_price, Decimal::from(2000));
    }
}
