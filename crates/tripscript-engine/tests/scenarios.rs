//! End-to-end scenarios through the public engine API.

use serde_json::{Value, json};
use tripscript_core::context::{ActionContext, TripState};
use tripscript_core::event::Event;
use tripscript_core::instruction::{Instruction, LogLevel};
use tripscript_engine::{ActionDispatcher, EventMatcher, Kernel, registry, validate_script};
use tripscript_test_support::{ContextBuilder, ScriptBuilder, fixed_time, sample_script};

fn params(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_scene_started_spec_matches_only_its_scene() {
    let script = sample_script();
    let evaluation = ContextBuilder::new().build();
    let event = Event::new("scene_started").with("scene", "intro");
    let context = ActionContext::new(&script, &evaluation, fixed_time()).with_event(&event);
    let matcher = EventMatcher::new(registry());

    assert!(matcher.matches_spec(&params(json!({"type": "scene_started", "scene": "intro"})), &event, &context));
    assert!(!matcher.matches_spec(&params(json!({"type": "scene_started", "scene": "finale"})), &event, &context));
}

#[test]
fn test_increment_value_equals_set_value_with_resolved_sum() {
    let script = sample_script();
    let evaluation = ContextBuilder::new().value("score", 3).build();
    let context = ActionContext::new(&script, &evaluation, fixed_time());
    let dispatcher = ActionDispatcher::new(registry());

    assert_eq!(
        dispatcher.apply("increment_value", &params(json!({"value_ref": "score", "delta": 2})), &context),
        dispatcher.apply("set_value", &params(json!({"value_ref": "score", "new_value_ref": 5})), &context),
    );
}

#[test]
fn test_start_scene_with_missing_scene_only_logs() {
    let script = sample_script();
    let evaluation = ContextBuilder::new().build();
    let context = ActionContext::new(&script, &evaluation, fixed_time());

    let result = ActionDispatcher::new(registry()).apply("start_scene", &params(json!({"scene_name": "finale"})), &context);

    match &result[..] {
        [Instruction::Log { level: LogLevel::Error, .. }] => {}
        other => panic!("expected a single error log, got {other:?}"),
    }
}

#[test]
fn test_starting_a_scene_cascades_into_its_triggers() {
    let script = ScriptBuilder::sample()
        .trigger(json!({
            "name": "enter_manor",
            "event": {"type": "cue_signaled", "cue": "bell"},
            "actions": [{"name": "start_scene", "scene_name": "manor"}]
        }))
        .trigger(json!({
            "name": "welcome",
            "scene": "manor",
            "event": {"type": "scene_started", "scene": "manor"},
            "actions": [{
                "name": "send_text",
                "from_role_name": "Butler",
                "to_role_name": "Detective",
                "content": "Welcome to the manor."
            }]
        }))
        .build();
    assert!(validate_script(registry(), &script).is_ok());
    let kernel = Kernel::new(registry(), &script, fixed_time());

    let result = kernel.process_event(
        &Event::new("cue_signaled").with("cue", "bell"),
        &ContextBuilder::new().scene("intro").build(),
    );

    let operations: Vec<&str> = result
        .instructions
        .iter()
        .map(|instruction| match instruction {
            Instruction::UpdateTripState { .. } => "update_trip_state",
            Instruction::UpdateTripHistory { .. } => "update_trip_history",
            Instruction::EmitEvent { .. } => "emit_event",
            Instruction::CreateMessage { .. } => "create_message",
            other => panic!("unexpected instruction {other:?}"),
        })
        .collect();
    assert_eq!(
        operations,
        vec![
            "update_trip_history",
            "update_trip_state",
            "emit_event",
            "update_trip_history",
            "create_message",
            "emit_event",
        ]
    );
    match &result.instructions[1] {
        Instruction::UpdateTripState { state } => {
            let expected = TripState {
                current_scene_name: Some("manor".to_owned()),
                current_page_names_by_role: [
                    ("Butler".to_owned(), "pantry".to_owned()),
                    ("Detective".to_owned(), "gate".to_owned()),
                ]
                .into_iter()
                .collect(),
                ..TripState::default()
            };
            assert_eq!(state, &expected);
        }
        other => panic!("expected UpdateTripState, got {other:?}"),
    }
}

#[test]
fn test_instructions_serialize_with_operation_tag() {
    let instruction = Instruction::log(LogLevel::Warn, "careful");

    assert_eq!(
        serde_json::to_value(&instruction).unwrap(),
        json!({"operation": "log", "level": "warn", "message": "careful"})
    );
}
