//! Last-resort description search over the whole document.
//!
//! Used when a row has a date and an amount but neither its typed fields nor
//! its own raw text gave a description. Two strategies run in order:
//!
//! 1. Nearby lines: find the amount printed in the full text and take the
//!    closest plausible description line above (up to 5) or below (up to 3).
//! 2. Sibling: find the closest line item on the same page that does have a
//!    description, locate that text in the document, and look around it for
//!    a line carrying this row's date as `MON DD`.
//!
//! Neither strategy scores its match. A coincidental hit is accepted as
//! readily as a good one.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use tally_core::Entity;
use tally_core::time::month_day_label;
use tracing::debug;

const LINES_BEFORE: usize = 5;
const LINES_AFTER: usize = 3;
const CHARS_BEFORE_SIBLING: usize = 200;
const CHARS_AFTER_SIBLING: usize = 500;

static BARE_MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]{2}\s+\d{1,2}$").expect("valid regex"));
static BARE_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}$").expect("valid regex"));
static BARE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\$?[\d,]+\.\d{2}$").expect("valid regex"));
static BARE_CARD_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.{2}\d{4}$").expect("valid regex"));

static SIBLING_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}\s+").expect("valid regex"));
static SIBLING_MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]{2}\s+\d{1,2}\s+").expect("valid regex"));
static SIBLING_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\$?[\d,]+\.\d{2}\s*").expect("valid regex"));
static SIBLING_CARD_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2}\d{4}\s*").expect("valid regex"));
static ACH_PAYMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ACH Payment\s*").expect("valid regex"));
static ACH_PULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ACH Pull\s*").expect("valid regex"));

const HEADER_LINES: &[&str] = &[
    "Description",
    "Date (UTC)",
    "Date",
    "Type",
    "Amount",
    "End of Day Balance",
    "CITIZENS PAID EARLY",
];

/// Could this line be a transaction description rather than a date, an
/// amount, a card suffix or table boilerplate?
pub fn is_valid_description(line: &str) -> bool {
    line.chars().count() >= 2
        && !BARE_MONTH_DAY.is_match(line)
        && !BARE_SLASH_DATE.is_match(line)
        && !BARE_AMOUNT.is_match(line)
        && !BARE_CARD_SUFFIX.is_match(line)
        && !HEADER_LINES.contains(&line)
        && !line.contains("Banking services provided")
}

/// The ways a statement may print `amount`: with and without thousands
/// separators, with and without a leading (signed) dollar sign.
pub fn amount_renderings(amount: f64) -> Vec<String> {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, decimal) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_thousands(whole);

    let mut out = vec![format!("{sign}${grouped}.{decimal}")];
    if grouped != whole {
        out.push(format!("{sign}${whole}.{decimal}"));
    }
    out.push(format!("{grouped}.{decimal}"));
    if grouped != whole {
        out.push(format!("{whole}.{decimal}"));
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Description-like remainder of a line item's text once its date, amount,
/// card suffix and ACH prefixes are removed.
pub fn sibling_description(mention: &str) -> Option<String> {
    let text = SIBLING_SLASH_DATE.replace(mention, "");
    let text = SIBLING_MONTH_DAY.replace(&text, "");
    let text = SIBLING_AMOUNT.replace(&text, "");
    let text = SIBLING_CARD_SUFFIX.replace(text.trim(), "");
    let text = ACH_PAYMENT.replace(&text, "");
    let text = ACH_PULL.replace(&text, "");
    let text = text.trim();

    (text.chars().count() > 2 && is_valid_description(text)).then(|| text.to_string())
}

#[derive(Debug, Clone, PartialEq)]
struct Found {
    description: String,
    offset: usize,
}

/// Document-wide search state. Text spans already attributed to one
/// transaction are never handed to another.
#[derive(Debug)]
pub struct DescriptionSearch<'a> {
    full_text: &'a str,
    entities: &'a [Entity],
    line_item_type: &'a str,
    used: HashSet<usize>,
}

impl<'a> DescriptionSearch<'a> {
    pub fn new(full_text: &'a str, entities: &'a [Entity], line_item_type: &'a str) -> Self {
        Self {
            full_text,
            entities,
            line_item_type,
            used: HashSet::new(),
        }
    }

    /// Description for the line item at `entity_index`, which resolved to
    /// `amount` on `date`.
    pub fn find(&mut self, amount: f64, date: &str, entity_index: usize) -> Option<String> {
        if self.full_text.is_empty() || amount == 0.0 || amount.is_nan() {
            return None;
        }

        let found = match self.near_amount(amount) {
            Some(found) => {
                debug!(offset = found.offset, "description recovered near amount");
                found
            }
            None => {
                let found = self.near_sibling(date, entity_index)?;
                debug!(offset = found.offset, "description recovered near sibling row");
                found
            }
        };

        self.used.insert(found.offset);
        Some(found.description)
    }

    fn near_amount(&self, amount: f64) -> Option<Found> {
        let renderings = amount_renderings(amount);

        let mut lines = Vec::new();
        let mut offset = 0;
        for line in self.full_text.split('\n') {
            lines.push((offset, line.trim()));
            offset += line.len() + 1;
        }

        let amount_lines = lines.iter().enumerate().filter(|(_, (_, line))| {
            renderings
                .iter()
                .any(|r| *line == r.as_str() || line.ends_with(r.as_str()))
        });

        for (i, (offset, _)) in amount_lines {
            if self.used.contains(offset) {
                continue;
            }

            let before = (1..=LINES_BEFORE).filter_map(|k| i.checked_sub(k));
            let after = (1..=LINES_AFTER).map(|k| i + k).take_while(|j| *j < lines.len());
            if let Some(line) = before
                .chain(after)
                .map(|j| lines[j].1)
                .find(|line| is_valid_description(line))
            {
                return Some(Found {
                    description: line.to_string(),
                    offset: *offset,
                });
            }
        }

        None
    }

    fn near_sibling(&self, date: &str, entity_index: usize) -> Option<Found> {
        let current = self.entities.get(entity_index)?;
        let current_y = current.vertical_position()?;
        let current_page = current.page()?;

        let anchor = self.closest_sibling_description(entity_index, current_page, current_y)?;
        let anchor_at = self.full_text.find(&anchor)?;
        let label = month_day_label(date)?.to_lowercase();

        let start = offset_back(self.full_text, anchor_at, CHARS_BEFORE_SIBLING);
        let end = offset_forward(self.full_text, anchor_at, CHARS_AFTER_SIBLING);
        let area = &self.full_text[start..end];

        area.split('\n')
            .map(str::trim)
            .filter(|line| line.to_lowercase().contains(&label) && is_valid_description(line))
            .filter_map(|line| {
                let offset = start + area.find(line)?;
                Some(Found {
                    description: line.to_string(),
                    offset,
                })
            })
            .find(|found| !self.used.contains(&found.offset))
    }

    fn closest_sibling_description(
        &self,
        entity_index: usize,
        page: i64,
        y: f64,
    ) -> Option<String> {
        let mut closest: Option<(f64, String)> = None;

        for (i, entity) in self.entities.iter().enumerate() {
            if i == entity_index
                || entity.kind != self.line_item_type
                || entity.page() != Some(page)
            {
                continue;
            }
            let Some(description) = sibling_description(entity.mention()) else {
                continue;
            };
            let Some(entity_y) = entity.vertical_position() else {
                continue;
            };

            let distance = (entity_y - y).abs();
            if closest.as_ref().is_none_or(|(best, _)| distance < *best) {
                closest = Some((distance, description));
            }
        }

        closest.map(|(_, description)| description)
    }
}

/// Byte offset `chars` characters before `from`, clamped to the start.
fn offset_back(text: &str, from: usize, chars: usize) -> usize {
    text[..from]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(from, |(i, _)| i)
}

/// Byte offset `chars` characters after `from`, clamped to the end.
fn offset_forward(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| from + i)
}
