//! Statement totals and balance.

use tally_core::{Balance, Totals, Transaction};

use crate::metadata::BalanceHints;

/// Round to cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn totals(items: &[Transaction]) -> Totals {
    let (positive, negative, net) = items.iter().fold((0.0, 0.0, 0.0), |(pos, neg, net), t| {
        if t.is_deposit() {
            (pos + t.amount, neg, net + t.amount)
        } else {
            (pos, neg + t.amount, net + t.amount)
        }
    });

    Totals {
        positive: round_cents(positive),
        negative: round_cents(negative),
        net: round_cents(net),
    }
}

/// Balance from the printed opening/closing figures. A missing side counts
/// as zero; with neither side there is no balance.
pub fn balance(hints: &BalanceHints) -> Option<Balance> {
    if hints.start.is_none() && hints.end.is_none() {
        return None;
    }
    let start = hints.start.unwrap_or(0.0);
    let end = hints.end.unwrap_or(0.0);
    Some(Balance {
        start,
        end,
        change: round_cents(end - start),
    })
}
