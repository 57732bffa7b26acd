//! Typed value normalizers for single entities.

use tally_core::Entity;
use tally_core::time::{iso_date, is_iso_date};

use crate::patterns::parse_money_text;

#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

/// Amount from the entity's typed money value, `None` when it has none.
pub fn normalized_money(entity: &Entity, default_currency: &str) -> Option<Money> {
    let money = entity.money_value()?;
    let units = money.units.unwrap_or(0) as f64;
    let nanos = money.nanos.unwrap_or(0) as f64 / 1e9;
    let currency = money
        .currency_code
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(default_currency);
    Some(Money {
        amount: units + nanos,
        currency: currency.to_string(),
    })
}

/// Typed money value if present, else the mention text parsed as money.
/// The currency is only known in the first case.
pub fn money_or_text(entity: &Entity, default_currency: &str) -> (f64, Option<String>) {
    match normalized_money(entity, default_currency) {
        Some(m) => (m.amount, Some(m.currency)),
        None => (parse_money_text(entity.mention()), None),
    }
}

/// `YYYY-MM-DD` from a complete typed date, or from normalized text already
/// in that shape. Partial dates are unavailable here.
pub fn normalized_date(entity: &Entity) -> Option<String> {
    if let Some(dv) = entity.date_value() {
        if let (Some(y), Some(m), Some(d)) = (dv.year(), dv.month(), dv.day()) {
            return Some(iso_date(y, m, d));
        }
    }
    entity
        .normalized_text()
        .filter(|t| is_iso_date(t))
        .map(str::to_string)
}
