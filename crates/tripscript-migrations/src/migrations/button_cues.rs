//! Replaces the cue a button, numberpad or directions panel used to signal
//! with the panel's own activation event.
//!
//! When nothing else signals the cue, the cue is deleted and every trigger
//! listening for it listens for the panel instead. When an action or QR code
//! still signals it, the cue stays and a new trigger relays the panel event
//! to the cue.

use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState};

const ID_BASE: u32 = 100_000;

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 9,
        name: "button_cues",
        document: Some(retarget_panel_cues),
        transforms: Vec::new(),
        fixtures: vec![
            Fixture::new(
                json!({
                    "pages": [{"panels": [{"type": "button", "id": 123, "cue": "cue"}]}],
                    "triggers": [{"event": {"type": "cue_signaled", "cue": "cue"}, "actions": [{}]}]
                }),
                json!({
                    "pages": [{"panels": [{"type": "button", "id": 123}]}],
                    "triggers": [{"event": {"type": "button_pressed", "button": 123}, "actions": [{}]}]
                }),
            ),
            Fixture::new(
                json!({
                    "cues": [{"name": "bell", "title": "Bell"}],
                    "pages": [{"name": "hall", "scene": "intro", "panels": [
                        {"type": "numberpad", "id": 7, "cue": "bell", "correct_ref": "code", "unknown": "x"}
                    ]}],
                    "triggers": [{
                        "name": "arrive",
                        "event": {"type": "scene_started", "scene": "intro"},
                        "actions": [{"name": "signal_cue", "cue_name": "bell"}]
                    }]
                }),
                json!({
                    "cues": [{"name": "bell", "title": "Bell"}],
                    "pages": [{"name": "hall", "scene": "intro", "panels": [{"type": "numberpad", "id": 7}]}],
                    "triggers": [
                        {
                            "name": "arrive",
                            "event": {"type": "scene_started", "scene": "intro"},
                            "actions": [{"name": "signal_cue", "cue_name": "bell"}]
                        },
                        {
                            "name": "panel-7",
                            "scene": "intro",
                            "event": {"type": "numberpad_submitted", "numberpad": 7},
                            "actions": [{"id": 100_001, "name": "signal_cue", "cue_name": "bell"}]
                        }
                    ]
                }),
            ),
        ],
    }
}

/// A panel that used to signal `cue`.
struct PanelCue {
    cue: String,
    panel_id: Value,
    event: Value,
    scene: Option<Value>,
}

fn activation_event(panel: &Map<String, Value>) -> Option<Value> {
    let id = panel.get("id").cloned().unwrap_or(Value::Null);
    match panel.get("type").and_then(Value::as_str)? {
        "button" => Some(json!({"type": "button_pressed", "button": id})),
        "numberpad" => Some(json!({"type": "numberpad_submitted", "numberpad": id})),
        "directions" => Some(json!({"type": "directions_arrived", "directions": id})),
        _ => None,
    }
}

fn collect_signaled(actions: &[Value], used: &mut BTreeSet<String>) {
    for action in actions {
        let signaled = action
            .get("cue_name")
            .and_then(Value::as_str)
            .filter(|_| action.get("name").and_then(Value::as_str) == Some("signal_cue"));
        if let Some(cue) = signaled {
            used.insert(cue.to_owned());
        }
        for key in ["actions", "else"] {
            if let Some(Value::Array(nested)) = action.get(key) {
                collect_signaled(nested, used);
            }
        }
        let elseifs = action.get("elseifs").and_then(Value::as_array);
        for elseif in elseifs.into_iter().flatten() {
            if let Some(Value::Array(nested)) = elseif.get("actions") {
                collect_signaled(nested, used);
            }
        }
    }
}

/// Cues something other than a panel signals.
fn cues_in_use(document: &Map<String, Value>) -> BTreeSet<String> {
    let mut used = BTreeSet::new();
    let triggers = document.get("triggers").and_then(Value::as_array);
    for trigger in triggers.into_iter().flatten() {
        if let Some(Value::Array(actions)) = trigger.get("actions") {
            collect_signaled(actions, &mut used);
        }
    }
    let qr_codes = document.get("qr_codes").and_then(Value::as_array);
    for qr_code in qr_codes.into_iter().flatten() {
        if let Some(cue) = qr_code.get("cue").and_then(Value::as_str) {
            used.insert(cue.to_owned());
        }
    }
    used
}

/// Strips the cue fields from activatable panels and returns what each
/// panel signaled.
fn detach_panel_cues(document: &mut Map<String, Value>) -> Vec<PanelCue> {
    let mut detached = Vec::new();
    let Some(Value::Array(pages)) = document.get_mut("pages") else {
        return detached;
    };
    for page in pages.iter_mut().filter_map(Value::as_object_mut) {
        let scene = page.get("scene").cloned();
        let Some(Value::Array(panels)) = page.get_mut("panels") else {
            continue;
        };
        for panel in panels.iter_mut().filter_map(Value::as_object_mut) {
            let Some(event) = activation_event(panel) else {
                continue;
            };
            let cue = panel.remove("cue");
            if panel.get("type").and_then(Value::as_str) == Some("numberpad") {
                panel.remove("correct_ref");
                panel.remove("unknown");
            }
            if let Some(Value::String(cue)) = cue {
                detached.push(PanelCue {
                    cue,
                    panel_id: panel.get("id").cloned().unwrap_or(Value::Null),
                    event,
                    scene: scene.clone(),
                });
            }
        }
    }
    detached
}

fn push_trigger(document: &mut Map<String, Value>, trigger: Value) {
    match document.entry("triggers").or_insert_with(|| Value::Array(Vec::new())) {
        Value::Array(triggers) => triggers.push(trigger),
        _ => tracing::warn!("triggers is not a list; panel trigger not added"),
    }
}

fn relay_trigger(panel: &PanelCue, scene: &Value, state: &mut MigrationState) -> Value {
    let id = match &panel.panel_id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };
    json!({
        "name": format!("panel-{id}"),
        "scene": scene,
        "event": panel.event,
        "actions": [{"id": ID_BASE + state.advance(1), "name": "signal_cue", "cue_name": panel.cue}]
    })
}

fn replace_cue(document: &mut Map<String, Value>, panel: &PanelCue) {
    if let Some(Value::Array(cues)) = document.get_mut("cues") {
        cues.retain(|cue| cue.get("name").and_then(Value::as_str) != Some(panel.cue.as_str()));
    }
    let Some(Value::Array(triggers)) = document.get_mut("triggers") else {
        return;
    };
    for trigger in triggers.iter_mut() {
        let listens = trigger.get("event").is_some_and(|event| {
            event.get("type").and_then(Value::as_str) == Some("cue_signaled")
                && event.get("cue").and_then(Value::as_str) == Some(panel.cue.as_str())
        });
        if !listens {
            continue;
        }
        if let Some(object) = trigger.as_object_mut() {
            object.insert("event".to_owned(), panel.event.clone());
        }
    }
}

fn retarget_panel_cues(document: &mut Map<String, Value>, state: &mut MigrationState) {
    let used = cues_in_use(document);
    for panel in detach_panel_cues(document) {
        if !used.contains(&panel.cue) {
            replace_cue(document, &panel);
            continue;
        }
        match &panel.scene {
            Some(scene) if !scene.is_null() => {
                let trigger = relay_trigger(&panel, scene, state);
                push_trigger(document, trigger);
            }
            _ => tracing::warn!(cue = %panel.cue, "panel without a scene keeps no trigger for its cue"),
        }
    }
}
