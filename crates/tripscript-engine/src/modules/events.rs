//! Event kinds and how trigger specs match runtime events.

use chrono::TimeDelta;
use serde_json::Value;
use tripscript_core::context::ActionContext;
use tripscript_core::event::Event;
use tripscript_core::script::{ScriptContent, flag, str_field};
use tripscript_core::time::parse_offset;
use tripscript_schema::registry::{MatchHook, Params};
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

#[must_use]
pub fn definitions() -> Vec<ModuleDefinition> {
    vec![
        event(
            "scene_started",
            "Occurs when a scene starts.",
            vec![("scene", PropertySpec::reference("scenes").required())],
            match_scene_started,
            Some(("scene", "scenes")),
        )
        .with_title(scene_started_title),
        event(
            "cue_signaled",
            "Occurs when a cue is signaled.",
            vec![("cue", PropertySpec::reference("cues").required())],
            match_cue_signaled,
            Some(("cue", "cues")),
        )
        .with_title(cue_signaled_title),
        event(
            "text_received",
            "Occurs when one role texts another.",
            vec![
                ("from", PropertySpec::reference("roles")),
                ("to", PropertySpec::reference("roles")),
                ("contains", PropertySpec::string().with_help("Only match messages containing this text.")),
            ],
            match_text_received,
            None,
        ),
        event(
            "call_received",
            "Occurs when a role receives a call.",
            vec![
                ("from", PropertySpec::reference("roles")),
                ("to", PropertySpec::reference("roles")),
            ],
            match_call_parties,
            None,
        ),
        event(
            "call_answered",
            "Occurs when a placed call is answered.",
            vec![
                ("from", PropertySpec::reference("roles")),
                ("to", PropertySpec::reference("roles")),
            ],
            match_call_parties,
            None,
        ),
        event(
            "call_ended",
            "Occurs when a call including a role ends.",
            vec![("role", PropertySpec::reference("roles").required())],
            match_call_ended,
            None,
        ),
        event(
            "query_responded",
            "Occurs when a player answers a spoken query.",
            vec![
                ("query", PropertySpec::string().required()),
                ("partial", PropertySpec::boolean()),
                ("final", PropertySpec::boolean()),
            ],
            match_query_responded,
            None,
        ),
        event(
            "geofence_entered",
            "Occurs when a role enters a geofence.",
            vec![
                ("role", PropertySpec::reference("roles").required()),
                ("geofence", PropertySpec::reference("geofences").required()),
            ],
            match_geofence_entered,
            Some(("geofence", "geofences")),
        ),
        event(
            "time_occurred",
            "Occurs once when a scheduled time arrives.",
            vec![
                ("time", PropertySpec::reference("times").required()),
                ("offset", PropertySpec::time_offset()),
            ],
            match_time_occurred,
            Some(("time", "times")),
        )
        .with_title(time_occurred_title),
        event(
            "button_pressed",
            "Occurs when a player presses a button panel.",
            vec![("button", PropertySpec::integer().required().with_help("Id of the button panel."))],
            match_button_pressed,
            None,
        ),
        event(
            "numberpad_submitted",
            "Occurs when a player submits a numberpad panel.",
            vec![("numberpad", PropertySpec::integer().required().with_help("Id of the numberpad panel."))],
            match_numberpad_submitted,
            None,
        ),
        event(
            "directions_arrived",
            "Occurs when a player arrives at the end of a directions panel.",
            vec![("directions", PropertySpec::integer().required().with_help("Id of the directions panel."))],
            match_directions_arrived,
            None,
        ),
    ]
}

fn event(
    name: &'static str,
    help: &'static str,
    properties: Vec<(&'static str, PropertySpec)>,
    matches: MatchHook,
    parent_param: Option<(&'static str, &'static str)>,
) -> ModuleDefinition {
    ModuleDefinition::new(name, help, properties, ModuleHooks::Event { matches, parent_param })
}

/// True when the spec leaves `key` open or the event carries the same value.
fn optional_eq(spec: &Params, event: &Event, key: &str) -> bool {
    str_field(spec, key).is_none_or(|expected| event.get_str(key) == Some(expected))
}

fn required_eq(spec: &Params, event: &Event, key: &str) -> bool {
    str_field(spec, key).is_some() && optional_eq(spec, event, key)
}

/// Panel ids are compared as JSON values, so `12` never matches `"12"`.
fn panel_eq(spec: &Params, event: &Event, key: &str) -> bool {
    match spec.get(key) {
        None | Some(Value::Null) => false,
        Some(expected) => event.get(key) == Some(expected),
    }
}

fn match_scene_started(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    required_eq(spec, event, "scene")
}

fn match_cue_signaled(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    required_eq(spec, event, "cue")
}

fn match_text_received(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    if !optional_eq(spec, event, "from") || !optional_eq(spec, event, "to") {
        return false;
    }
    match str_field(spec, "contains").filter(|part| !part.is_empty()) {
        Some(part) => event
            .get_str("content")
            .is_some_and(|content| content.to_lowercase().contains(&part.to_lowercase())),
        None => true,
    }
}

fn match_call_parties(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    optional_eq(spec, event, "from") && optional_eq(spec, event, "to")
}

fn match_call_ended(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    let Some(role) = str_field(spec, "role") else {
        return false;
    };
    event
        .get("roles")
        .and_then(Value::as_array)
        .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some(role)))
}

fn match_query_responded(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    if !required_eq(spec, event, "query") {
        return false;
    }
    let partial = event.get("partial").and_then(Value::as_bool).unwrap_or(false);
    if flag(spec, "partial") && !partial {
        return false;
    }
    if flag(spec, "final") && partial {
        return false;
    }
    true
}

fn match_geofence_entered(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    required_eq(spec, event, "role") && required_eq(spec, event, "geofence")
}

fn match_time_occurred(spec: &Params, event: &Event, context: &ActionContext<'_>) -> bool {
    let Some(scheduled) = str_field(spec, "time").and_then(|time| context.evaluation.schedule.get(time)) else {
        return false;
    };
    let Some(timestamp) = event.get("timestamp").and_then(Value::as_i64) else {
        return false;
    };
    let offset = str_field(spec, "offset")
        .and_then(parse_offset)
        .unwrap_or(TimeDelta::zero());
    scheduled
        .checked_add_signed(offset)
        .is_some_and(|due| timestamp >= due.timestamp())
}

fn match_button_pressed(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    panel_eq(spec, event, "button")
}

fn match_numberpad_submitted(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    panel_eq(spec, event, "numberpad")
}

fn match_directions_arrived(spec: &Params, event: &Event, _: &ActionContext<'_>) -> bool {
    panel_eq(spec, event, "directions")
}

fn titled(script: &ScriptContent, collection: &str, name: &str) -> String {
    script
        .find(collection, name)
        .and_then(|resource| str_field(resource, "title"))
        .unwrap_or(name)
        .to_owned()
}

fn scene_started_title(spec: &Params, script: &ScriptContent) -> String {
    let scene = str_field(spec, "scene").unwrap_or_default();
    format!("scene \"{}\" started", titled(script, "scenes", scene))
}

fn cue_signaled_title(spec: &Params, script: &ScriptContent) -> String {
    let cue = str_field(spec, "cue").unwrap_or_default();
    format!("cue \"{}\"", titled(script, "cues", cue))
}

fn time_occurred_title(spec: &Params, script: &ScriptContent) -> String {
    let time = titled(script, "times", str_field(spec, "time").unwrap_or_default());
    match str_field(spec, "offset") {
        Some(offset) if offset.starts_with('-') => format!("{} before {time}", &offset[1..]),
        Some(offset) => format!("{offset} after {time}"),
        None => format!("at {time}"),
    }
}
