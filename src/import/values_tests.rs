#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── parse_amount ──────────────────────────────────────────────

#[test]
fn test_parse_amount_basic() {
    assert_eq!(parse_amount("100.50"), Some(dec!(100.50)));
    assert_eq!(parse_amount("-42.99"), Some(dec!(-42.99)));
}

#[test]
fn test_parse_amount_with_currency_and_commas() {
    assert_eq!(parse_amount("$1,234.56"), Some(dec!(1234.56)));
    assert_eq!(parse_amount("-$99.99"), Some(dec!(-99.99)));
    assert_eq!(parse_amount("-1,234,567.89"), Some(dec!(-1234567.89)));
}

#[test]
fn test_parse_amount_parentheses_negative() {
    assert_eq!(parse_amount("(500.00)"), Some(dec!(-500.00)));
}

#[test]
fn test_parse_amount_is_exact() {
    // 0.1 + 0.2 must stay 0.3 exactly.
    let sum = parse_amount("0.1").unwrap() + parse_amount("0.2").unwrap();
    assert_eq!(sum, dec!(0.3));
}

#[test]
fn test_parse_amount_empty_or_invalid() {
    assert_eq!(parse_amount(""), None);
    assert_eq!(parse_amount("  "), None);
    assert_eq!(parse_amount("abc"), None);
    assert_eq!(parse_amount("12.3.4"), None);
    assert_eq!(parse_amount("(12"), None);
}

// ── parse_date ────────────────────────────────────────────────

#[test]
fn test_parse_date_month_first() {
    assert_eq!(parse_date("1/15/24", DateOrder::MonthFirst), Some(ymd(2024, 1, 15)));
    assert_eq!(parse_date("01/15/2024", DateOrder::MonthFirst), Some(ymd(2024, 1, 15)));
    assert_eq!(parse_date("12-31-99", DateOrder::MonthFirst), Some(ymd(1999, 12, 31)));
}

#[test]
fn test_parse_date_day_first() {
    assert_eq!(parse_date("15/1/24", DateOrder::DayFirst), Some(ymd(2024, 1, 15)));
    assert_eq!(parse_date("15.01.2024", DateOrder::DayFirst), Some(ymd(2024, 1, 15)));
}

#[test]
fn test_parse_date_convention_is_applied_uniformly() {
    // Ambiguous dates follow the configured order, never a guess.
    assert_eq!(parse_date("3/4/24", DateOrder::MonthFirst), Some(ymd(2024, 3, 4)));
    assert_eq!(parse_date("3/4/24", DateOrder::DayFirst), Some(ymd(2024, 4, 3)));
    // And an impossible reading is rejected rather than flipped.
    assert_eq!(parse_date("13/1/24", DateOrder::MonthFirst), None);
}

#[test]
fn test_parse_date_quicken_apostrophe_year() {
    assert_eq!(parse_date("1/15'04", DateOrder::MonthFirst), Some(ymd(2004, 1, 15)));
    assert_eq!(parse_date("1/15'99", DateOrder::MonthFirst), Some(ymd(2099, 1, 15)));
}

#[test]
fn test_parse_date_space_padded() {
    assert_eq!(parse_date(" 1/ 5/ 4", DateOrder::MonthFirst), Some(ymd(2004, 1, 5)));
    assert_eq!(parse_date("1/ 5'12", DateOrder::MonthFirst), Some(ymd(2012, 1, 5)));
}

#[test]
fn test_parse_date_two_digit_year_pivot() {
    assert_eq!(parse_date("1/1/69", DateOrder::MonthFirst), Some(ymd(2069, 1, 1)));
    assert_eq!(parse_date("1/1/70", DateOrder::MonthFirst), Some(ymd(1970, 1, 1)));
}

#[test]
fn test_parse_date_iso_ignores_order() {
    assert_eq!(parse_date("2024-01-15", DateOrder::DayFirst), Some(ymd(2024, 1, 15)));
    assert_eq!(parse_date("2024-01-15", DateOrder::MonthFirst), Some(ymd(2024, 1, 15)));
}

#[test]
fn test_parse_date_invalid() {
    assert_eq!(parse_date("", DateOrder::MonthFirst), None);
    assert_eq!(parse_date("yesterday", DateOrder::MonthFirst), None);
    assert_eq!(parse_date("2/30/24", DateOrder::MonthFirst), None);
    assert_eq!(parse_date("1/1/124", DateOrder::MonthFirst), None);
}
