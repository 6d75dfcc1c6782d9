//! Gives every trigger a single `event`, splitting multi-event triggers.

use serde_json::{Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 4,
        name: "single_trigger_event",
        document: None,
        transforms: vec![(Scope::Collection("triggers"), single_event)],
        fixtures: vec![Fixture::new(
            json!({
                "triggers": [
                    {"name": "quiet", "events": [], "actions": []},
                    {"name": "bell", "events": [{"type": "cue_signaled", "cue": "bell"}], "actions": []},
                    {"name": "either", "scene": "intro", "events": [
                        {"type": "cue_signaled", "cue": "bell"},
                        {"type": "cue_signaled", "cue": "gong"},
                        {"type": "scene_started", "scene": "intro"}
                    ], "actions": [{"name": "signal_cue", "cue_name": "horn"}]}
                ]
            }),
            json!({
                "triggers": [
                    {"name": "quiet", "actions": []},
                    {"name": "bell", "event": {"type": "cue_signaled", "cue": "bell"}, "actions": []},
                    {"name": "either", "scene": "intro", "event": {"type": "cue_signaled", "cue": "bell"},
                     "actions": [{"name": "signal_cue", "cue_name": "horn"}]},
                    {"name": "either-2", "scene": "intro", "event": {"type": "cue_signaled", "cue": "gong"},
                     "actions": [{"name": "signal_cue", "cue_name": "horn"}]},
                    {"name": "either-3", "scene": "intro", "event": {"type": "scene_started", "scene": "intro"},
                     "actions": [{"name": "signal_cue", "cue_name": "horn"}]}
                ]
            }),
        )],
    }
}

fn single_event(trigger: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    let Some(object) = trigger.as_object_mut() else {
        return TransformOutcome::Keep;
    };
    let events = match object.remove("events") {
        Some(Value::Array(events)) => events,
        _ => return TransformOutcome::Keep,
    };
    let name = object.get("name").and_then(Value::as_str).unwrap_or_default().to_owned();
    let mut events = events.into_iter();
    let Some(first) = events.next() else {
        return TransformOutcome::Keep;
    };

    let mut split = Vec::with_capacity(events.len() + 1);
    for (index, event) in events.enumerate() {
        let mut copy = object.clone();
        copy.insert("name".to_owned(), Value::from(format!("{name}-{}", index + 2)));
        copy.insert("event".to_owned(), event);
        split.push(Value::Object(copy));
    }
    object.insert("event".to_owned(), first);
    if split.is_empty() {
        return TransformOutcome::Keep;
    }
    split.insert(0, trigger.clone());
    TransformOutcome::Split(split)
}
