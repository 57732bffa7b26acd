//! Checks recovered from the document text.
//!
//! The extraction service regularly misses check images entirely, so the
//! full text is scanned for the check layouts of known banks. Every hit is
//! a withdrawal.

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

use tally_core::Transaction;
use tally_core::time::iso_from_us_date;
use tracing::debug;

use crate::patterns::parse_float_prefix;

// Eastern Bank check images:
//   CK #1042
//   PD 3/7/2025
//   $80.00
static CHECK_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CK\s*#\s*(\d+)\s*\n\s*PD\s*(\d{1,2}/\d{1,2}/\d{4})\s*\n?\s*\$?([\d,]+\.?\d*)")
        .expect("valid regex")
});

// Citizens Bank check listing: "260 03/14/2025 $1,080.00"
static CHECK_LISTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{3,4})[ \t]+(\d{2}/\d{2}/\d{4})[ \t]+\$([\d,]+\.?\d*)").expect("valid regex")
});

/// Checks found in `full_text` whose numbers are not already among
/// `existing`, in scan order.
pub fn recover_checks(full_text: &str, existing: &[Transaction]) -> Vec<Transaction> {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter_map(|t| t.check_number.clone())
        .filter(|n| !n.is_empty())
        .collect();

    let mut out = Vec::new();
    for pattern in [&*CHECK_IMAGE, &*CHECK_LISTING] {
        for caps in pattern.captures_iter(full_text) {
            if let Some(txn) = check_from_captures(&caps, &seen) {
                debug!(check = &caps[1], "check recovered from text");
                seen.insert(caps[1].to_string());
                out.push(txn);
            }
        }
    }
    out
}

fn check_from_captures(caps: &Captures<'_>, seen: &HashSet<String>) -> Option<Transaction> {
    let number = &caps[1];
    if seen.contains(number) {
        return None;
    }

    let date = iso_from_us_date(&caps[2])?;
    let amount = -parse_float_prefix(&caps[3].replace(',', "")).abs();
    if amount == 0.0 || amount.is_nan() {
        return None;
    }

    Some(Transaction {
        date,
        description: format!("Check #{number}"),
        amount,
        currency: None,
        check_number: Some(number.to_string()),
        raw_text: caps[0].to_string(),
        description_confidence: None,
    })
}
