use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// How to read the first two components of a `a/b/y` date. Fixed for a whole
/// ingestion run; never guessed per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(crate) enum DateOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

#[allow(clippy::unwrap_used)]
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").unwrap());

// `1/15/24`, `01/15/2024`, `1/15'24`, ` 1/ 5/ 4`, `15.01.2024`
#[allow(clippy::unwrap_used)]
static QIF_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2})[ ]*[/.\-][ ]*([0-9]{1,2})[ ]*(['/.\-])[ ]*([0-9]{1,4})$").unwrap()
});

pub(crate) fn parse_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(caps) = ISO_DATE.captures(s) {
        let y = caps[1].parse().ok()?;
        let m = caps[2].parse().ok()?;
        let d = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let caps = QIF_DATE.captures(s)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year_text = &caps[4];
    let raw_year: i32 = year_text.parse().ok()?;

    let year = match (&caps[3], year_text.len()) {
        // Quicken writes years from 2000 on as `'04`.
        ("'", 1..=2) => 2000 + raw_year,
        (_, 1..=2) if raw_year < 70 => 2000 + raw_year,
        (_, 1..=2) => 1900 + raw_year,
        (_, 4) => raw_year,
        _ => return None,
    };

    let (month, day) = match order {
        DateOrder::MonthFirst => (first, second),
        DateOrder::DayFirst => (second, first),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a QIF amount exactly. Accepts currency symbols, thousands
/// separators and `(12.50)` negatives.
pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\t'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (negate, body) = match cleaned.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let value = Decimal::from_str(body).ok()?;
    Some(if negate { -value } else { value })
}

#[cfg(test)]
#[path = "values_tests.rs"]
mod tests;
