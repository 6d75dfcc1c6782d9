//! Condition ops evaluated inside `if` clauses.

use regex::RegexBuilder;
use serde_json::Value;
use tripscript_core::condition::ConditionScope;
use tripscript_core::error::EngineError;
use tripscript_core::lookup::{as_number, is_truthy};
use tripscript_schema::registry::{EvalHook, Params};
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

use crate::modules::text;

const COMPARATORS: &[&str] = &["<", "<=", "==", ">=", ">"];
const COMPARISON_METHODS: &[&str] = &["equals", "contains"];
const AFFIRMATIVE_PARTS: &[&str] = &["y", "yes", "sure", "ok"];
const EVENT_CONTENT: &str = "event.content";

#[must_use]
pub fn definitions() -> Vec<ModuleDefinition> {
    vec![
        condition(
            "value_is_true",
            "Passes if the value is present and not false.",
            vec![("ref", PropertySpec::lookupable().required())],
            eval_value_is_true,
        ),
        condition(
            "value_equals",
            "Passes if two values match, ignoring case.",
            vec![
                ("ref1", PropertySpec::lookupable().required()),
                ("ref2", PropertySpec::lookupable().required()),
            ],
            eval_value_equals,
        ),
        condition(
            "value_contains",
            "Passes if one text value contains another, ignoring case.",
            vec![
                ("string_ref", PropertySpec::lookupable().required()),
                ("part_ref", PropertySpec::lookupable().required()),
            ],
            eval_value_contains,
        ),
        condition(
            "value_matches",
            "Passes if a text value matches a regular expression, ignoring case.",
            vec![
                ("string_ref", PropertySpec::lookupable().required()),
                ("regex_ref", PropertySpec::lookupable().required()),
            ],
            eval_value_matches,
        ),
        condition(
            "value_compare",
            "Passes if the first value compares to the second, numerically unless a text method is given.",
            vec![
                ("ref1", PropertySpec::lookupable().required()),
                ("comparator", PropertySpec::one_of(COMPARATORS).with_default(">=")),
                ("comparison_method", PropertySpec::one_of(COMPARISON_METHODS)),
                ("ref2", PropertySpec::lookupable().required()),
            ],
            eval_value_compare,
        ),
        condition(
            "text_contains",
            "Passes if the triggering message contains some text, ignoring case.",
            vec![("part", PropertySpec::string().required())],
            eval_text_contains,
        ),
        condition(
            "text_is_affirmative",
            "Passes if the triggering message reads as a yes.",
            vec![],
            eval_text_is_affirmative,
        ),
        condition(
            "and",
            "Passes if every item passes.",
            vec![("items", PropertySpec::list(PropertySpec::if_clause()).required())],
            eval_and,
        ),
        condition(
            "or",
            "Passes if any item passes.",
            vec![("items", PropertySpec::list(PropertySpec::if_clause()).required())],
            eval_or,
        ),
        condition(
            "not",
            "Passes if the item fails.",
            vec![("item", PropertySpec::if_clause().required())],
            eval_not,
        ),
    ]
}

fn condition(
    name: &'static str,
    help: &'static str,
    properties: Vec<(&'static str, PropertySpec)>,
    eval: EvalHook,
) -> ModuleDefinition {
    ModuleDefinition::new(name, help, properties, ModuleHooks::Condition { eval })
}

fn resolve(params: &Params, key: &str, scope: &dyn ConditionScope) -> Value {
    scope.lookup_ref(params.get(key).unwrap_or(&Value::Null))
}

/// Lowercased text form of a value. Every falsy value reads as empty text.
fn comparable_text(value: &Value) -> String {
    match value {
        falsy if !is_truthy(falsy) => String::new(),
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

fn text_equals(first: &Value, second: &Value) -> bool {
    if !is_truthy(first) && !is_truthy(second) {
        return true;
    }
    comparable_text(first) == comparable_text(second)
}

fn text_contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack.as_str(), needle.as_str()) {
        (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        _ => false,
    }
}

fn items(params: &Params) -> &[Value] {
    params.get("items").and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

fn eval_value_is_true(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    Ok(is_truthy(&resolve(params, "ref", scope)))
}

fn eval_value_equals(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    Ok(text_equals(&resolve(params, "ref1", scope), &resolve(params, "ref2", scope)))
}

fn eval_value_contains(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    Ok(text_contains(&resolve(params, "string_ref", scope), &resolve(params, "part_ref", scope)))
}

fn eval_value_matches(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    let subject = resolve(params, "string_ref", scope);
    let pattern = resolve(params, "regex_ref", scope);
    let (Some(subject), Some(pattern)) = (subject.as_str(), pattern.as_str()) else {
        return Ok(false);
    };
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .is_ok_and(|regex| regex.is_match(subject)))
}

fn eval_value_compare(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    let (first, second) = (resolve(params, "ref1", scope), resolve(params, "ref2", scope));
    match params.get("comparison_method").and_then(Value::as_str) {
        Some("equals") => return Ok(text_equals(&first, &second)),
        Some("contains") => return Ok(text_contains(&first, &second)),
        _ => {}
    }
    let (first, second) = (as_number(&first), as_number(&second));
    #[allow(clippy::float_cmp)]
    let result = match params.get("comparator").and_then(Value::as_str).unwrap_or(">=") {
        "<" => first < second,
        "<=" => first <= second,
        "==" => first == second,
        ">" => first > second,
        _ => first >= second,
    };
    Ok(result)
}

fn eval_text_contains(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    let content = scope.lookup_ref(&Value::from(EVENT_CONTENT));
    let part = params.get("part").cloned().unwrap_or(Value::Null);
    Ok(text_contains(&content, &part))
}

fn eval_text_is_affirmative(_: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    let content = scope.lookup_ref(&Value::from(EVENT_CONTENT));
    Ok(content.as_str().is_some_and(|content| {
        let lower = content.to_lowercase();
        AFFIRMATIVE_PARTS.iter().any(|part| lower.contains(part))
    }))
}

fn eval_and(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    for item in items(params) {
        if !scope.eval_if(Some(item))? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_or(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    for item in items(params) {
        if scope.eval_if(Some(item))? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn eval_not(params: &Params, scope: &dyn ConditionScope) -> Result<bool, EngineError> {
    match params.get("item") {
        None | Some(Value::Null) => Ok(false),
        item => Ok(!scope.eval_if(item)?),
    }
}

/// Op name of a clause, empty when it has none.
pub(crate) fn op_of(clause: &Params) -> &str {
    text(clause, "op")
}
