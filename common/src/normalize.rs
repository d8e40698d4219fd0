//! セル値の正規化
//!
//! Turns raw spreadsheet cells into the strings typed into the form.
//!
//! ## Rules
//! - strings: trimmed; values with more than one `" - "` delimiter keep only
//!   their first two segments (`"MAIN ST - LOT 4 - EXTRA"` → `"MAIN ST - LOT 4"`)
//! - free text: trimmed only
//! - numbers: longest leading decimal number, two decimals, `"0.00"` when
//!   nothing parses; a comma ends the number (`"12,000"` → `"12.00"`)

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Delimiter separating location segments in street/lot descriptions
pub const SEGMENT_DELIMITER: &str = " - ";

/// Segments kept by [`normalize_string`]
pub const MAX_SEGMENTS: usize = 2;

/// Value used when a numeric cell is blank or unparseable
pub const DEFAULT_NUMBER: &str = "0.00";

/// A raw spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Cell rendered as text; integral numbers drop their fraction
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_plain_number(*n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn format_plain_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Trims and truncates after the second [`SEGMENT_DELIMITER`].
///
/// Empty trailing segments are dropped first, so a dangling delimiter
/// (`"MAIN ST - LOT 4 - "`) leaves no stray `" -"` behind.
pub fn normalize_string(value: &str) -> String {
    let mut segments: Vec<&str> = value
        .trim_start()
        .split(SEGMENT_DELIMITER)
        .map(str::trim)
        .collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    segments.truncate(MAX_SEGMENTS);
    segments.join(SEGMENT_DELIMITER)
}

/// Trims free text (comments, codes, dates) without truncating.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// Parses the leading decimal number of `value` and formats it with two
/// decimals; [`DEFAULT_NUMBER`] when nothing parses.
///
/// Trailing units are ignored (`"12.5 ft"` → `"12.50"`). Parsing stops at the
/// first character that cannot continue a decimal literal, commas included.
pub fn normalize_number(value: &str) -> String {
    lazy_static::lazy_static! {
        static ref LEADING_NUMBER_RE: Regex = Regex::new(
            r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)"
        ).unwrap();
    }

    let parsed = LEADING_NUMBER_RE
        .find(value)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok());

    match parsed {
        Some(n) => format_number(n),
        None => DEFAULT_NUMBER.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return DEFAULT_NUMBER.to_string();
    }
    let formatted = format!("{:.2}", n);
    // "-0.00" reads as a typo in the form
    if formatted == "-0.00" {
        DEFAULT_NUMBER.to_string()
    } else {
        formatted
    }
}

/// [`normalize_string`] for a raw cell
pub fn normalize_cell_string(cell: &CellValue) -> String {
    normalize_string(&cell.as_text())
}

/// [`normalize_text`] for a raw cell
pub fn normalize_cell_text(cell: &CellValue) -> String {
    normalize_text(&cell.as_text())
}

/// [`normalize_number`] for a raw cell; numeric cells skip parsing
pub fn normalize_cell_number(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(n) => format_number(*n),
        CellValue::Text(s) => normalize_number(s),
        CellValue::Empty => DEFAULT_NUMBER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number("12.3"), "12.30");
        assert_eq!(normalize_number("abc"), "0.00");
        assert_eq!(normalize_number(""), "0.00");
        assert_eq!(normalize_number("7"), "7.00");
    }

    #[test]
    fn test_normalize_number_leading_prefix() {
        assert_eq!(normalize_number("  12.5 ft"), "12.50");
        assert_eq!(normalize_number("-3"), "-3.00");
        assert_eq!(normalize_number(".5"), "0.50");
        assert_eq!(normalize_number("1e2"), "100.00");
        assert_eq!(normalize_number("ft 12"), "0.00");
    }

    #[test]
    fn test_normalize_number_stops_at_comma() {
        assert_eq!(normalize_number("1,234.5"), "1.00");
        assert_eq!(normalize_number("12,000"), "12.00");
        assert_eq!(normalize_number("1.5e"), "1.50");
    }

    #[test]
    fn test_normalize_number_negative_zero() {
        assert_eq!(normalize_number("-0"), "0.00");
    }

    #[test]
    fn test_normalize_string_truncates_after_second_delimiter() {
        assert_eq!(normalize_string("MAIN ST - LOT 4 - EXTRA"), "MAIN ST - LOT 4");
        assert_eq!(normalize_string("A - B - C - D"), "A - B");
    }

    #[test]
    fn test_normalize_string_dangling_delimiter() {
        assert_eq!(normalize_string("MAIN ST - LOT 4 - "), "MAIN ST - LOT 4");
        assert_eq!(normalize_string("MAIN ST - "), "MAIN ST");
        assert_eq!(normalize_string("   "), "");
    }

    #[test]
    fn test_normalize_string_passthrough() {
        assert_eq!(normalize_string("MAIN ST"), "MAIN ST");
        assert_eq!(normalize_string("  MAIN ST  "), "MAIN ST");
        assert_eq!(normalize_string("MAIN ST - LOT 4"), "MAIN ST - LOT 4");
        assert_eq!(normalize_string(""), "");
    }

    #[test]
    fn test_normalize_text_keeps_delimiters() {
        assert_eq!(normalize_text(" a - b - c "), "a - b - c");
    }

    #[test]
    fn test_normalize_cells() {
        assert_eq!(normalize_cell_number(&CellValue::Number(7.0)), "7.00");
        assert_eq!(normalize_cell_number(&CellValue::Number(1234.567)), "1234.57");
        assert_eq!(normalize_cell_number(&CellValue::Empty), "0.00");
        assert_eq!(normalize_cell_number(&CellValue::from("8.1")), "8.10");
        assert_eq!(normalize_cell_string(&CellValue::Number(12.0)), "12");
        assert_eq!(normalize_cell_string(&CellValue::Empty), "");
    }

    #[test]
    fn test_normalization_deterministic() {
        let cell = CellValue::from(" ELM AVE - LOT 2 - NORTH ");
        assert_eq!(normalize_cell_string(&cell), normalize_cell_string(&cell));
    }

    #[test]
    fn test_cell_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::from("   ").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }
}
