//! Transaction rows from line-item entities.
//!
//! Each line item yields at most one transaction. Date, description and
//! amount come from the item's typed sub-fields when they are confident
//! enough, with a chain of fallbacks for whatever is still missing:
//! check-image text, the previous row's date, the row's own raw text and
//! finally a search of the whole document.

use std::collections::HashSet;

use tally_core::time::checked_iso_date;
use tally_core::{DescriptionConfidence, Entity, Transaction};
use tracing::debug;

use crate::config::ExtractConfig;
use crate::metadata::PeriodContext;
use crate::normalize::{money_or_text, normalized_date};
use crate::patterns::{
    amount_from_raw_text, clean_description, description_from_raw_text, parse_check_info,
};
use crate::recovery::DescriptionSearch;

/// Counters for the per-document log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub line_items: usize,
    pub kept: usize,
    pub dropped: usize,
    pub descriptions_recovered: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct PropertyFields {
    date: Option<String>,
    description: String,
    amount: f64,
    amount_confidence: f64,
    currency: Option<String>,
}

/// Extract transactions from every line item, in document order. A check
/// number is emitted at most once; later rows carrying it are dropped.
pub fn extract_rows(
    entities: &[Entity],
    period: &PeriodContext,
    config: &ExtractConfig,
    search: &mut DescriptionSearch<'_>,
) -> (Vec<Transaction>, RowStats) {
    let mut stats = RowStats::default();
    let mut last_date: Option<String> = None;
    let mut seen_checks = HashSet::new();
    let mut out = Vec::new();

    for (index, entity) in entities.iter().enumerate() {
        if entity.kind != config.line_item_type {
            continue;
        }
        stats.line_items += 1;

        let row = RowBuilder {
            entity,
            index,
            period,
            config,
        };
        let Some(txn) = row.build(&mut last_date, search, &mut stats) else {
            stats.dropped += 1;
            continue;
        };

        // The same check often shows up both as a register row and as an image.
        if let Some(number) = txn.check_number.as_deref().filter(|n| !n.is_empty()) {
            if !seen_checks.insert(number.to_string()) {
                debug!(entity = index, "line item dropped: check already listed");
                stats.dropped += 1;
                continue;
            }
        }

        stats.kept += 1;
        out.push(txn);
    }

    (out, stats)
}

struct RowBuilder<'a> {
    entity: &'a Entity,
    index: usize,
    period: &'a PeriodContext,
    config: &'a ExtractConfig,
}

impl RowBuilder<'_> {
    fn build(
        &self,
        last_date: &mut Option<String>,
        search: &mut DescriptionSearch<'_>,
        stats: &mut RowStats,
    ) -> Option<Transaction> {
        let raw_text = self.entity.mention().trim().replace('\n', " ");
        let fields = self.property_fields();
        if let Some(date) = &fields.date {
            *last_date = Some(date.clone());
        }

        let PropertyFields {
            mut date,
            mut description,
            mut amount,
            currency,
            ..
        } = fields;

        if self.entity.properties.is_empty() && !raw_text.is_empty() {
            if let Some(parsed) = amount_from_raw_text(&raw_text) {
                amount = parsed;
            }
        }

        let mut description_confidence =
            (!description.trim().is_empty()).then_some(DescriptionConfidence::High);

        // Check images: "CK #1042 PD 3/7/2025"
        let mut check_number = None;
        if !description.is_empty() {
            let info = parse_check_info(&description);
            if date.is_none() {
                date = info.paid_date;
            }
            check_number = info.check_number;
        }

        // Rows of one day group often carry the date only on the first row.
        if date.is_none() {
            date = last_date.clone();
        }

        if description.trim().is_empty() && !raw_text.is_empty() {
            description = description_from_raw_text(&raw_text);
            if !description.is_empty() {
                description_confidence = Some(DescriptionConfidence::Medium);
            }
        }

        let amount_known = amount != 0.0 && !amount.is_nan();
        if description.trim().is_empty() && amount_known {
            if let Some(date) = date.as_deref().filter(|d| !d.is_empty()) {
                if let Some(found) = search.find(amount, date, self.index) {
                    description = found;
                    description_confidence = Some(DescriptionConfidence::Low);
                    stats.descriptions_recovered += 1;
                }
            }
        }

        let description = clean_description(&description);
        if description.is_empty() {
            description_confidence = None;
        }

        let Some(date) = date.filter(|d| !d.is_empty()) else {
            debug!(entity = self.index, "line item dropped: no date");
            return None;
        };
        if !amount_known {
            debug!(entity = self.index, "line item dropped: no usable amount");
            return None;
        }

        // Checks are always written by the account holder.
        if check_number.is_some() && amount > 0.0 {
            amount = -amount;
        }

        Some(Transaction {
            date,
            description,
            amount,
            currency,
            check_number,
            raw_text,
            description_confidence,
        })
    }

    fn property_fields(&self) -> PropertyFields {
        self.entity
            .properties
            .iter()
            .filter(|p| p.confidence_or_zero() >= self.config.min_property_confidence)
            .fold(PropertyFields::default(), |mut acc, prop| {
                self.absorb_property(&mut acc, prop);
                acc
            })
    }

    fn absorb_property(&self, acc: &mut PropertyFields, prop: &Entity) {
        let kind = prop.kind.as_str();

        if kind.contains("_date") && acc.date.is_none() {
            let date = self.property_date(prop);
            if !date.is_empty() {
                acc.date = Some(date);
            }
        }

        if kind.contains("_description") {
            let part = prop.mention().trim();
            if !part.is_empty() {
                if !acc.description.is_empty() {
                    acc.description.push(' ');
                }
                acc.description.push_str(part);
            }
        }

        // Composite tags like "transaction_deposit_date" are not amounts.
        if kind.contains("_date") || kind.contains("_description") {
            return;
        }
        let sign = if kind.contains("transaction_withdrawal") {
            -1.0
        } else if kind.contains("transaction_deposit") {
            1.0
        } else {
            return;
        };

        let confidence = prop.confidence_or_zero();
        if confidence > acc.amount_confidence {
            let (value, currency) = money_or_text(prop, &self.config.default_currency);
            acc.amount = sign * value.abs();
            if currency.is_some() {
                acc.currency = currency;
            }
            acc.amount_confidence = confidence;
        }
    }

    /// Full typed date, or a month/day typed date dated into the statement
    /// period, or the text as printed.
    fn property_date(&self, prop: &Entity) -> String {
        if let Some(iso) = normalized_date(prop) {
            return iso;
        }
        if let Some(dv) = prop.date_value() {
            if let (None, Some(month), Some(day)) = (dv.year(), dv.month(), dv.day()) {
                if let Some(iso) = self
                    .period
                    .infer_year(month)
                    .and_then(|year| checked_iso_date(year, month, day))
                {
                    return iso;
                }
            }
        }
        prop.mention().trim().to_string()
    }
}
