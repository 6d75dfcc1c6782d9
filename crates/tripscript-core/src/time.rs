//! Time offset shorthand, e.g. `10s`, `-90.1m`, `2h`.

use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;

static OFFSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?[hms]$").expect("valid regex"));

/// Returns true when `raw` is a well-formed time offset.
#[must_use]
pub fn is_time_offset(raw: &str) -> bool {
    OFFSET_PATTERN.is_match(raw)
}

/// Converts a time offset into a duration. Malformed offsets, and offsets
/// too large for a `TimeDelta`, are `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn parse_offset(raw: &str) -> Option<TimeDelta> {
    if !is_time_offset(raw) {
        return None;
    }
    let (number, unit) = raw.split_at(raw.len() - 1);
    let amount: f64 = number.parse().ok()?;
    let multiplier = match unit {
        "h" => 3600.0,
        "m" => 60.0,
        _ => 1.0,
    };
    let millis = (amount * multiplier * 1000.0).round();
    // `as` saturates, so anything at or past the i64 bounds is out of range.
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}
