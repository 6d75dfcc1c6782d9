//! Parses legacy string conditions into op trees.
//!
//! The legacy grammar is a space-separated word list: `[not] [op] args…`,
//! joined by `and` / `or`, with parentheses for grouping and double quotes
//! to keep spaces inside a word. A bare reference means `istrue`.

use serde_json::{Map, Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 1,
        name: "structured_ifs",
        document: None,
        transforms: vec![(Scope::IfClauses, structure)],
        fixtures: vec![
            Fixture::new(
                json!({
                    "triggers": [
                        {"name": "t", "if": "(not a and b)"},
                        {"name": "u", "if": "((equals abc_def ghi_jkl and contains x \"y\") or not zzz)"}
                    ]
                }),
                json!({
                    "triggers": [
                        {"name": "t", "if": {"op": "and", "items": [
                            {"op": "not", "item": {"op": "istrue", "ref": "a"}},
                            {"op": "istrue", "ref": "b"}
                        ]}},
                        {"name": "u", "if": {"op": "or", "items": [
                            {"op": "and", "items": [
                                {"op": "equals", "ref1": "abc_def", "ref2": "ghi_jkl"},
                                {"op": "contains", "string_ref": "x", "part_ref": "\"y\""}
                            ]},
                            {"op": "not", "item": {"op": "istrue", "ref": "zzz"}}
                        ]}}
                    ]
                }),
            ),
            Fixture::new(
                json!({
                    "scenes": [{"name": "s", "active_if": "equals mood \"very good\""}],
                    "triggers": [{"name": "t", "actions": [
                        {"name": "conditional", "if": "a or (b and not contains c d)", "actions": []}
                    ]}]
                }),
                json!({
                    "scenes": [{"name": "s", "active_if":
                        {"op": "equals", "ref1": "mood", "ref2": "\"very good\""}}],
                    "triggers": [{"name": "t", "actions": [
                        {"name": "conditional", "if": {"op": "or", "items": [
                            {"op": "istrue", "ref": "a"},
                            {"op": "and", "items": [
                                {"op": "istrue", "ref": "b"},
                                {"op": "not", "item": {"op": "contains", "string_ref": "c", "part_ref": "d"}}
                            ]}
                        ]}, "actions": []}
                    ]}]
                }),
            ),
        ],
    }
}

fn structure(clause: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    let Some(text) = clause.as_str() else {
        return TransformOutcome::Keep;
    };
    if text.trim().is_empty() {
        return TransformOutcome::Remove;
    }
    match parse(text) {
        Ok(tree) => TransformOutcome::Replace(tree),
        Err(reason) => {
            tracing::warn!(clause = text, %reason, "left unparseable condition as-is");
            TransformOutcome::Keep
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Word(String),
    Group(Vec<Term>),
}

fn argument_names(op: &str) -> Option<&'static [&'static str]> {
    match op {
        "istrue" => Some(&["ref"]),
        "equals" => Some(&["ref1", "ref2"]),
        "contains" => Some(&["string_ref", "part_ref"]),
        "matches" => Some(&["string_ref", "regex_ref"]),
        _ => None,
    }
}

fn parse(text: &str) -> Result<Value, String> {
    to_clause(&tokenize(text))
}

/// Splits into words and parenthesised groups. Quoted words keep their
/// quotes and inner spaces.
fn tokenize(text: &str) -> Vec<Term> {
    let mut stack: Vec<Vec<Term>> = vec![Vec::new()];
    let mut word = String::new();
    let mut quoted = false;

    for ch in text.chars() {
        if quoted {
            word.push(ch);
            quoted = ch != '"';
            continue;
        }
        match ch {
            '"' => {
                word.push(ch);
                quoted = true;
            }
            '(' => {
                flush(&mut word, &mut stack);
                stack.push(Vec::new());
            }
            ')' => {
                flush(&mut word, &mut stack);
                if stack.len() > 1 {
                    let group = stack.pop().unwrap_or_default();
                    if let Some(parent) = stack.last_mut() {
                        parent.push(Term::Group(group));
                    }
                }
            }
            c if c.is_whitespace() => flush(&mut word, &mut stack),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut stack);
    while stack.len() > 1 {
        let group = stack.pop().unwrap_or_default();
        if let Some(parent) = stack.last_mut() {
            parent.push(Term::Group(group));
        }
    }
    stack.pop().unwrap_or_default()
}

fn flush(word: &mut String, stack: &mut [Vec<Term>]) {
    if word.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.push(Term::Word(std::mem::take(word)));
    }
}

fn is_word(term: &Term, expected: &str) -> bool {
    matches!(term, Term::Word(word) if word == expected)
}

fn to_clause(terms: &[Term]) -> Result<Value, String> {
    if let [Term::Group(inner)] = terms {
        return to_clause(inner);
    }
    for joiner in ["or", "and"] {
        if terms.iter().any(|term| is_word(term, joiner)) {
            let items = terms
                .split(|term| is_word(term, joiner))
                .map(to_clause)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(json!({"op": joiner, "items": items}));
        }
    }
    let words = terms
        .iter()
        .map(|term| match term {
            Term::Word(word) => Ok(word.as_str()),
            Term::Group(_) => Err("groups must be joined by \"and\" or \"or\"".to_owned()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    to_op(&words)
}

fn to_op(words: &[&str]) -> Result<Value, String> {
    if let Some((&"not", rest)) = words.split_first() {
        return Ok(json!({"op": "not", "item": to_op(rest)?}));
    }
    let (op, args) = match words {
        [single] => ("istrue", std::slice::from_ref(single)),
        [op, args @ ..] => (*op, args),
        [] => ("istrue", words),
    };
    let names = argument_names(op).ok_or_else(|| format!("unknown condition \"{op}\""))?;
    let mut clause = Map::new();
    clause.insert("op".to_owned(), Value::from(op));
    for (name, arg) in names.iter().zip(args) {
        clause.insert((*name).to_owned(), Value::from(*arg));
    }
    Ok(Value::Object(clause))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_reference_means_istrue() {
        assert_eq!(parse("lit").unwrap(), json!({"op": "istrue", "ref": "lit"}));
    }

    #[test]
    fn test_not_prefix_wraps_the_op() {
        assert_eq!(
            parse("not equals a b").unwrap(),
            json!({"op": "not", "item": {"op": "equals", "ref1": "a", "ref2": "b"}})
        );
    }

    #[test]
    fn test_or_binds_looser_than_and() {
        assert_eq!(
            parse("a and b or c").unwrap(),
            json!({"op": "or", "items": [
                {"op": "and", "items": [{"op": "istrue", "ref": "a"}, {"op": "istrue", "ref": "b"}]},
                {"op": "istrue", "ref": "c"}
            ]})
        );
    }

    #[test]
    fn test_quoted_words_keep_spaces() {
        assert_eq!(
            parse("matches name \"^a b$\"").unwrap(),
            json!({"op": "matches", "string_ref": "name", "regex_ref": "\"^a b$\""})
        );
    }

    #[test]
    fn test_unknown_op_is_an_error() {
        match parse("between a b c") {
            Err(reason) => assert_eq!(reason, "unknown condition \"between\""),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_adjacent_groups_are_an_error() {
        assert!(parse("(a) (b)").is_err());
    }

    #[test]
    fn test_unparseable_clause_is_kept() {
        let mut clause = Value::from("frobnicate x");
        let outcome = structure(&mut clause, &mut MigrationState::default());
        assert_eq!(outcome, TransformOutcome::Keep);
        assert_eq!(clause, "frobnicate x");
    }

    #[test]
    fn test_empty_clause_is_removed() {
        let mut clause = Value::from("  ");
        assert_eq!(structure(&mut clause, &mut MigrationState::default()), TransformOutcome::Remove);
    }
}
