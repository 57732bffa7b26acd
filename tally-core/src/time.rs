//! Calendar helpers for statement dates.

use chrono::{Month, NaiveDate};

/// Render a date as zero-padded `YYYY-MM-DD` without validating it.
pub fn iso_date(year: i32, month: u32, day: u32) -> String {
    format!("{year:04}-{month:02}-{day:02}")
}

/// Like [`iso_date`], but only for dates that exist on the calendar.
pub fn checked_iso_date(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// True for strings shaped exactly like `YYYY-MM-DD`.
pub fn is_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

/// Convert a US `M/D/YYYY` date ("3/7/2025") to `2025-03-07`.
pub fn iso_from_us_date(s: &str) -> Option<String> {
    let mut it = s.trim().split('/');
    let month: u32 = it.next()?.parse().ok()?;
    let day: u32 = it.next()?.parse().ok()?;
    let year: i32 = it.next()?.parse().ok()?;
    if it.next().is_some() {
        return None;
    }
    Some(iso_date(year, month, day))
}

/// Printed-statement label for a date: `2025-03-24` or `3/24` becomes `MAR 24`.
pub fn month_day_label(date: &str) -> Option<String> {
    let (month, day) = if is_iso_date(date) {
        (date[5..7].parse::<u32>().ok()?, date[8..10].parse::<u32>().ok()?)
    } else {
        let (m, d) = date.split_once('/')?;
        if m.is_empty() || d.is_empty() || m.len() > 2 || d.len() > 2 {
            return None;
        }
        (m.parse::<u32>().ok()?, d.parse::<u32>().ok()?)
    };

    if !(1..=31).contains(&day) {
        return None;
    }
    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    Some(format!("{} {day:02}", month.name()[..3].to_uppercase()))
}
