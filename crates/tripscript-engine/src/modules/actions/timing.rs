//! Waiting and logging.

use tripscript_core::context::ActionContext;
use tripscript_core::instruction::{Instruction, LogLevel};
use tripscript_core::time::parse_offset;
use tripscript_schema::registry::Params;
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

use crate::modules::text;

pub(super) fn wait() -> ModuleDefinition {
    ModuleDefinition::new(
        "wait",
        "Pause the rest of the trigger for a duration.",
        vec![("duration", PropertySpec::time_offset().required())],
        ModuleHooks::Action {
            apply: Some(apply_wait),
        },
    )
}

pub(super) fn wait_for_time() -> ModuleDefinition {
    ModuleDefinition::new(
        "wait_for_time",
        "Pause the rest of the trigger until a scheduled time.",
        vec![
            ("time_name", PropertySpec::reference("times").required()),
            ("offset", PropertySpec::time_offset()),
        ],
        ModuleHooks::Action {
            apply: Some(apply_wait_for_time),
        },
    )
}

pub(super) fn log() -> ModuleDefinition {
    ModuleDefinition::new(
        "log",
        "Record a message for operators.",
        vec![
            ("level", PropertySpec::one_of(&["info", "warn", "error"]).required()),
            ("message", PropertySpec::string().required()),
        ],
        ModuleHooks::Action {
            apply: Some(apply_log),
        },
    )
}

fn apply_wait(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let duration = text(params, "duration");
    match parse_offset(duration).and_then(|offset| context.evaluate_at.checked_add_signed(offset)) {
        Some(until) => vec![Instruction::WaitUntil { until }],
        None => vec![Instruction::error(format!("Invalid wait duration \"{duration}\"."))],
    }
}

fn apply_wait_for_time(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let time_name = text(params, "time_name");
    let Some(scheduled) = context.evaluation.schedule.get(time_name) else {
        return vec![Instruction::error(format!("Time \"{time_name}\" is not scheduled."))];
    };
    let raw_offset = params.get("offset").and_then(serde_json::Value::as_str);
    let until = match raw_offset {
        Some(raw) => parse_offset(raw).and_then(|offset| scheduled.checked_add_signed(offset)),
        None => Some(*scheduled),
    };
    match until {
        Some(until) => vec![Instruction::WaitUntil { until }],
        None => vec![Instruction::error(format!(
            "Invalid offset \"{}\" for time \"{time_name}\".",
            raw_offset.unwrap_or_default()
        ))],
    }
}

fn apply_log(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let level = match text(params, "level") {
        "error" => LogLevel::Error,
        "warn" => LogLevel::Warn,
        _ => LogLevel::Info,
    };
    vec![Instruction::log(level, context.template(text(params, "message")))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::actions::test_context::{at, params, script};
    use chrono::TimeDelta;
    use serde_json::json;
    use tripscript_core::context::EvaluationContext;

    #[test]
    fn test_wait_resumes_after_duration() {
        let (script, evaluation) = (script(), EvaluationContext::default());
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_wait(&params(json!({"duration": "90s"})), &context);

        assert_eq!(
            result,
            vec![Instruction::WaitUntil {
                until: at() + TimeDelta::seconds(90)
            }]
        );
    }

    #[test]
    fn test_wait_for_time_applies_offset_to_schedule() {
        let script = script();
        let mut evaluation = EvaluationContext::default();
        evaluation.schedule.insert("dinner".to_owned(), at() + TimeDelta::hours(8));
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_wait_for_time(&params(json!({"time_name": "dinner", "offset": "-15m"})), &context);

        assert_eq!(
            result,
            vec![Instruction::WaitUntil {
                until: at() + TimeDelta::hours(8) - TimeDelta::minutes(15)
            }]
        );
    }

    #[test]
    fn test_wait_with_out_of_range_duration_logs_error() {
        let (script, evaluation) = (script(), EvaluationContext::default());
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_wait(&params(json!({"duration": "9999999999h"})), &context);

        assert_eq!(result, vec![Instruction::error("Invalid wait duration \"9999999999h\".")]);
    }

    #[test]
    fn test_wait_for_time_with_out_of_range_offset_logs_error() {
        let script = script();
        let mut evaluation = EvaluationContext::default();
        evaluation.schedule.insert("dinner".to_owned(), at());
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_wait_for_time(&params(json!({"time_name": "dinner", "offset": "-9999999999h"})), &context);

        assert_eq!(
            result,
            vec![Instruction::error("Invalid offset \"-9999999999h\" for time \"dinner\".")]
        );
    }

    #[test]
    fn test_wait_for_unscheduled_time_logs_error() {
        let (script, evaluation) = (script(), EvaluationContext::default());
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_wait_for_time(&params(json!({"time_name": "dinner"})), &context);

        assert_eq!(result, vec![Instruction::error("Time \"dinner\" is not scheduled.")]);
    }

    #[test]
    fn test_log_templates_message() {
        let script = script();
        let evaluation = EvaluationContext {
            values: params(json!({"clues": 4})),
            ..EvaluationContext::default()
        };
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_log(&params(json!({"level": "warn", "message": "{{clues}} clues found"})), &context);

        assert_eq!(result, vec![Instruction::log(LogLevel::Warn, "4 clues found")]);
    }
}
