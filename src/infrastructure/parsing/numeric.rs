//! Strict numeric parsing for price and quantity fields
//!
//! Unlike a prefix parse, "12 left" or "1,23" are rejected outright. A
//! rejected value becomes `RawValue::Missing`, never an error: one item's
//! malformed markup must not fail the whole run.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::RawValue;

lazy_static! {
    /// Optional leading currency symbol, then a plain or comma-grouped decimal
    static ref STRICT_NUMBER: Regex = Regex::new(
        r"^(?:[$€£¥₩]\s*)?([+-]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|[+-]?\.\d+)$"
    )
    .unwrap_or_else(|e| panic!("invalid numeric pattern: {e}"));
}

/// Parse a projected string as a finite number
pub fn parse_strict(raw: &str) -> Option<f64> {
    let captures = STRICT_NUMBER.captures(raw.trim())?;
    let digits = captures.get(1)?.as_str().replace(',', "");
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Projected string to raw value for a numeric field
pub fn to_numeric_value(raw: Option<&str>) -> RawValue {
    raw.and_then(parse_strict).map_or(RawValue::Missing, RawValue::Number)
}
