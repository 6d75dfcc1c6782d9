//! Value refs, truthiness and text templating.
//!
//! A value ref is either a literal (`5`, `true`, `null`, `"quoted"`) or a
//! dotted path into the evaluation context.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::context::EvaluationContext;
use crate::event::Event;

static TEMPLATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([\w\-.:]+)\s*\}\}").expect("valid regex"));

static IF_ELSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{%\s*if\s+(.+?)\s*%\}(.*?)(?:\{%\s*else\s*%\}(.*?))?\{%\s*endif\s*%\}")
        .expect("valid regex")
});

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid regex"));

static ISO_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.?\d*Z").expect("valid regex")
});

/// Resolves a value ref or literal. Unresolvable refs are null.
#[must_use]
pub fn lookup_ref(context: &EvaluationContext, event: Option<&Event>, reference: &Value) -> Value {
    let raw = match reference {
        Value::Null | Value::Bool(_) | Value::Number(_) => return reference.clone(),
        Value::String(raw) => raw.as_str(),
        Value::Array(_) | Value::Object(_) => return Value::Null,
    };
    if let Some(number) = parse_number(raw) {
        return number_value(number);
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Some(inner) = strip_quotes(raw) {
        return Value::String(inner.to_owned());
    }
    context.lookup_path(raw, event)
}

/// Walks the remaining dotted segments of a path below `root`.
#[must_use]
pub fn walk_path(root: Option<&Value>, rest: Option<&str>) -> Value {
    let Some(mut current) = root else {
        return Value::Null;
    };
    if let Some(rest) = rest {
        for segment in rest.split('.') {
            let next = match current {
                Value::Object(object) => object.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Value::Null,
            }
        }
    }
    current.clone()
}

/// Writes `value` at a dotted path, creating intermediate objects and
/// replacing non-object intermediates.
pub fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            root.insert(path.to_owned(), value);
        }
        Some((head, rest)) => {
            let child = root
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                set_path(child, rest, value);
            }
        }
    }
}

/// Truthiness of a resolved value: null, false, zero and `""` are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric reading of a resolved value; anything non-numeric is zero.
#[must_use]
pub fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::String(s) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Converts a float to JSON, preferring an integer representation so that
/// values computed arithmetically compare equal to parsed literals.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn number_value(number: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
        return Value::from(number as i64);
    }
    serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number)
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let starts_numeric = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if !starts_numeric {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn strip_quotes(raw: &str) -> Option<&str> {
    if raw.len() < 2 {
        return None;
    }
    let quoted = (raw.starts_with('"') && raw.ends_with('"'))
        || (raw.starts_with('\'') && raw.ends_with('\''));
    quoted.then(|| &raw[1..raw.len() - 1])
}

/// Renders a resolved value for display inside templated text.
#[must_use]
pub fn display_value(value: &Value, timezone: Option<FixedOffset>) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".to_owned(),
        Value::Bool(false) => "No".to_owned(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => display_string(s, timezone),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn display_string(raw: &str, timezone: Option<FixedOffset>) -> String {
    if ISO_TIME_PATTERN.is_match(raw) {
        if let Ok(at) = raw.parse::<DateTime<Utc>>() {
            let offset = timezone.unwrap_or_else(|| Utc.fix());
            return at.with_timezone(&offset).format("%-I:%M%P").to_string();
        }
    }
    if PHONE_PATTERN.is_match(raw) {
        return format!("({}) {}-{}", &raw[0..3], &raw[3..6], &raw[6..]);
    }
    raw.to_owned()
}

/// Interpolates `{{ref}}` placeholders, then `{% if ref %}…{% else %}…{% endif %}`
/// blocks, against the evaluation context.
#[must_use]
pub fn template_text(context: &EvaluationContext, event: Option<&Event>, text: &str) -> String {
    let interpolated = TEMPLATE_PATTERN.replace_all(text, |caps: &Captures<'_>| {
        let value = lookup_ref(context, event, &Value::String(caps[1].to_owned()));
        display_value(&value, context.timezone)
    });
    IF_ELSE_PATTERN
        .replace_all(&interpolated, |caps: &Captures<'_>| {
            let flag = lookup_ref(context, event, &Value::String(caps[1].to_owned()));
            if is_truthy(&flag) {
                caps[2].to_owned()
            } else {
                caps.get(3).map_or_else(String::new, |m| m.as_str().to_owned())
            }
        })
        .into_owned()
}
