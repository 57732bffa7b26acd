//! Literal text heuristics for statement rows.
//!
//! Each pattern matches one layout observed in real statements. New bank
//! layouts get a new pattern here rather than a generalized grammar.

use regex::Regex;
use std::sync::LazyLock;

use tally_core::time::iso_from_us_date;

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

// "Coffee Shop -$5.00" / "Coffee Shop $1,234.5"
static DOLLAR_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\$[\d,]+\.?\d*)$").expect("valid regex"));
// "Coffee Shop -1,234.56"
static DECIMAL_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(-?[\d,]+\.\d{2})$").expect("valid regex"));

// "Dec 01 " / "11/3 "
static LEADING_MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}\s+\d{1,2}\s+").expect("valid regex"));
static LEADING_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}\s+").expect("valid regex"));
static TRAILING_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-?\$?[\d,]+\.?\d*$").expect("valid regex"));

// Check images: "CK #1042" and "PD 3/7/2025"
static PAID_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PD\s*(\d{1,2}/\d{1,2}/\d{4})").expect("valid regex"));
static CHECK_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CK\s*#\s*(\d+)").expect("valid regex"));

// Masked card suffix "..9891"
static CARD_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\.{2,}\d{4}$").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static LEADING_GLYPHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-→←↑↓<>]+").expect("valid regex"));
static TRAILING_GLYPHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-→←↑↓<>]+$").expect("valid regex"));

/// Parse the leading number of `s` the lenient way OCR text needs:
/// trailing junk is ignored, no number at all gives NaN.
pub fn parse_float_prefix(s: &str) -> f64 {
    FLOAT_PREFIX
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(f64::NAN)
}

/// "$1,234.56" -> 1234.56
pub fn parse_money_text(s: &str) -> f64 {
    let stripped: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    parse_float_prefix(&stripped)
}

/// Amount printed at the end of a row's raw text, if any.
pub fn amount_from_raw_text(raw: &str) -> Option<f64> {
    let caps = DOLLAR_TAIL.captures(raw).or_else(|| DECIMAL_TAIL.captures(raw))?;
    Some(parse_money_text(&caps[1]))
}

/// Row text with the leading date and trailing amount removed.
pub fn description_from_raw_text(raw: &str) -> String {
    let s = LEADING_MONTH_DAY.replace(raw, "");
    let s = LEADING_SLASH_DATE.replace(&s, "");
    let s = TRAILING_AMOUNT.replace(&s, "");
    s.trim().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInfo {
    /// ISO paid date from "PD M/D/YYYY"
    pub paid_date: Option<String>,
    /// Digits from "CK #1234"
    pub check_number: Option<String>,
}

pub fn parse_check_info(description: &str) -> CheckInfo {
    CheckInfo {
        paid_date: PAID_DATE
            .captures(description)
            .and_then(|c| iso_from_us_date(&c[1])),
        check_number: CHECK_NUMBER
            .captures(description)
            .map(|c| c[1].to_string()),
    }
}

/// Drop card suffixes, collapse whitespace, trim arrows and dashes.
pub fn clean_description(description: &str) -> String {
    let s = CARD_SUFFIX.replace(description, "");
    let s = WHITESPACE_RUN.replace_all(&s, " ");
    let s = LEADING_GLYPHS.replace(&s, "");
    let s = TRAILING_GLYPHS.replace(&s, "");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12.50 CR"), 12.5);
        assert_eq!(parse_float_prefix("  -3"), -3.0);
        assert_eq!(parse_float_prefix(".5"), 0.5);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(parse_float_prefix("").is_nan());
    }

    #[test]
    fn test_parse_money_text() {
        assert_eq!(parse_money_text("$1,234.56"), 1234.56);
        assert_eq!(parse_money_text("-$20.00"), -20.0);
        assert!(parse_money_text("$").is_nan());
    }

    #[test]
    fn test_amount_from_raw_text() {
        assert_eq!(amount_from_raw_text("Dec 01 NETFLIX.COM -$15.49"), Some(-15.49));
        assert_eq!(amount_from_raw_text("11/3 PAYROLL ACME 1,200.00"), Some(1200.0));
        assert_eq!(amount_from_raw_text("11/3 PAYROLL ACME"), None);
        // Two decimals are required without a dollar sign
        assert_eq!(amount_from_raw_text("Ref 12345"), None);
    }

    #[test]
    fn test_description_from_raw_text() {
        assert_eq!(description_from_raw_text("Dec 01 NETFLIX.COM -$15.49"), "NETFLIX.COM");
        assert_eq!(description_from_raw_text("11/3 Zelle to J Smith 40.00"), "Zelle to J Smith");
        assert_eq!(description_from_raw_text("Dec 01 -$15.49"), "");
    }

    #[test]
    fn test_parse_check_info() {
        let info = parse_check_info("CK #1042 PD 3/7/2025");
        assert_eq!(info.check_number.as_deref(), Some("1042"));
        assert_eq!(info.paid_date.as_deref(), Some("2025-03-07"));

        let info = parse_check_info("ck# 77");
        assert_eq!(info.check_number.as_deref(), Some("77"));
        assert_eq!(info.paid_date, None);

        assert_eq!(parse_check_info("Grocery Outlet"), CheckInfo::default());
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("AMAZON MKTPL   ..9891"), "AMAZON MKTPL");
        assert_eq!(clean_description("→ Transfer to  Savings -"), "Transfer to Savings");
        assert_eq!(clean_description("  <  ACH   Pull  >  "), "ACH Pull");
    }
}
