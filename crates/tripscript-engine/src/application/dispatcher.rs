//! Action dispatch: resolve, validate, apply.

use tracing::instrument;
use tripscript_core::context::ActionContext;
use tripscript_core::instruction::Instruction;
use tripscript_schema::registry::Params;
use tripscript_schema::{Category, Properties, Registry, Validator};

/// Runs action modules. Never fails: every problem becomes a log instruction.
#[derive(Debug, Clone, Copy)]
pub struct ActionDispatcher<'r> {
    registry: &'r Registry,
}

impl<'r> ActionDispatcher<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Applies the action `name` with `params`. An empty result means no
    /// effect.
    #[must_use]
    #[instrument(skip_all, fields(action = name))]
    pub fn apply(&self, name: &str, params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
        let module = match self.registry.lookup(Category::Actions, name) {
            Ok(module) => module,
            Err(err) => {
                tracing::warn!(error = %err, "unknown action");
                return vec![Instruction::error(format!("Unknown action \"{name}\"."))];
            }
        };
        let Some(apply) = module.apply_hook() else {
            tracing::warn!("structural action reached the dispatcher");
            return vec![Instruction::error(format!("Action \"{name}\" cannot be applied directly."))];
        };
        let properties = self.registry.member_properties(module);
        let findings = Validator::new(self.registry, context.script).check_properties("", &properties, params);
        if !findings.errors.is_empty() {
            tracing::warn!(errors = findings.errors.len(), "action params failed validation");
            let messages: Vec<&str> = findings.errors.iter().map(|e| e.message.as_str()).collect();
            return vec![Instruction::error(format!(
                "Invalid params for action \"{name}\": {}",
                messages.join(" ")
            ))];
        }
        tracing::debug!("applying action");
        apply(&with_defaults(&properties, params), context)
    }
}

fn with_defaults(properties: &Properties, params: &Params) -> Params {
    let mut filled = params.clone();
    for (key, spec) in properties {
        if let Some(default) = &spec.default {
            filled.entry(*key).or_insert_with(|| default.clone());
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;
    use chrono::{TimeZone, Utc};
    use serde_json::{Map, Value, json};
    use tripscript_core::context::EvaluationContext;
    use tripscript_core::instruction::LogLevel;
    use tripscript_core::script::ScriptContent;

    fn script() -> ScriptContent {
        ScriptContent::from_value(json!({
            "scenes": [{"name": "intro", "title": "Intro"}],
            "cues": [{"name": "bell", "title": "Bell"}]
        }))
        .unwrap()
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn apply(name: &str, raw: Value, evaluation: &EvaluationContext) -> Vec<Instruction> {
        let script = script();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let context = ActionContext::new(&script, evaluation, at);
        ActionDispatcher::new(registry()).apply(name, &params(raw), &context)
    }

    #[test]
    fn test_unknown_action_degrades_to_error_log() {
        let result = apply("summon_ghost", json!({}), &EvaluationContext::default());

        assert_eq!(result, vec![Instruction::error("Unknown action \"summon_ghost\".")]);
    }

    #[test]
    fn test_conditional_is_never_applied() {
        let result = apply("conditional", json!({"if": null}), &EvaluationContext::default());

        match &result[..] {
            [Instruction::Log { level: LogLevel::Error, .. }] => {}
            other => panic!("expected a single error log, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_params_degrade_without_applying() {
        let result = apply("start_scene", json!({"scene_name": "finale"}), &EvaluationContext::default());

        assert_eq!(
            result,
            vec![Instruction::error(
                "Invalid params for action \"start_scene\": Reference param \"scene_name\" (\"finale\") is not in collection \"scenes\"."
            )]
        );
        assert!(!result.iter().any(Instruction::mutates_state));
    }

    #[test]
    fn test_defaults_fill_missing_params() {
        let evaluation = EvaluationContext {
            values: params(json!({"clues": 3})),
            ..EvaluationContext::default()
        };

        let result = apply("increment_value", json!({"value_ref": "clues"}), &evaluation);

        assert_eq!(
            result,
            vec![Instruction::UpdateTripValues {
                values: params(json!({"clues": 4}))
            }]
        );
    }

    #[test]
    fn test_increment_matches_set_value_of_resolved_sum() {
        let evaluation = EvaluationContext {
            values: params(json!({"score": 3})),
            ..EvaluationContext::default()
        };

        let incremented = apply("increment_value", json!({"value_ref": "score", "delta": 2}), &evaluation);
        let assigned = apply("set_value", json!({"value_ref": "score", "new_value_ref": 5}), &evaluation);

        assert_eq!(incremented, assigned);
    }
}
