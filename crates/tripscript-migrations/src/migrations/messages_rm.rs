//! Inlines the retired `messages` collection into the actions and events
//! that referenced it, picking `send_<medium>` / `<medium>_received` by
//! medium, and renames the message condition ops to their `text_*` names.

use serde_json::{Map, Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

const STASH_KEY: &str = "messages";

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 3,
        name: "messages_rm",
        document: Some(stash_messages),
        transforms: vec![
            (Scope::Actions, inline_message_actions),
            (Scope::Collection("triggers"), rename_received_events),
            (Scope::IfClauses, rename_message_ops),
        ],
        fixtures: vec![
            Fixture::new(
                json!({
                    "messages": [{"name": "msg1", "medium": "audio", "from": "Bob", "content": "x"}],
                    "triggers": [{
                        "events": [{"type": "message_received", "medium": "text", "from": "Gabe"}],
                        "active_if": {"op": "message_is_affirmative"},
                        "actions": [
                            {"name": "send_message", "message_name": "msg1", "to_role_name": "Ted"},
                            {"name": "custom_message", "medium": "image", "content": "path.jpg"}
                        ]
                    }]
                }),
                json!({
                    "triggers": [{
                        "events": [{"type": "text_received", "from": "Gabe"}],
                        "active_if": {"op": "text_is_affirmative"},
                        "actions": [
                            {"name": "send_audio", "from_role_name": "Bob", "to_role_name": "Ted", "content": "x"},
                            {"name": "send_image", "content": "path.jpg"}
                        ]
                    }]
                }),
            ),
            Fixture::new(
                json!({
                    "messages": [
                        {"name": "welcome", "medium": "text", "from": "Butler", "content": "Welcome, {{player.name}}."}
                    ],
                    "triggers": [{
                        "name": "greet",
                        "events": [{"type": "message_received", "from": "Detective"}],
                        "actions": [
                            {"name": "conditional", "if": {"op": "message_contains", "part": "hello"}, "actions": [
                                {"name": "send_message", "message_name": "welcome", "to_role_name": "Maid"}
                            ]}
                        ]
                    }]
                }),
                json!({
                    "triggers": [{
                        "name": "greet",
                        "events": [{"type": "text_received", "from": "Detective"}],
                        "actions": [
                            {"name": "conditional", "if": {"op": "text_contains", "part": "hello"}, "actions": [
                                {"name": "send_text", "from_role_name": "Butler", "to_role_name": "Maid",
                                 "content": "Welcome, {{player.name}}."}
                            ]}
                        ]
                    }]
                }),
            ),
        ],
    }
}

fn stash_messages(document: &mut Map<String, Value>, state: &mut MigrationState) {
    let messages = document.remove(STASH_KEY).unwrap_or(Value::Array(Vec::new()));
    state.stash.insert(STASH_KEY.to_owned(), messages);
}

fn stashed_message<'s>(state: &'s MigrationState, name: &str) -> Option<&'s Map<String, Value>> {
    state
        .stash
        .get(STASH_KEY)
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_object)
        .find(|message| message.get("name").and_then(Value::as_str) == Some(name))
}

fn medium_of(object: &Map<String, Value>) -> &str {
    object.get("medium").and_then(Value::as_str).unwrap_or("text")
}

fn inline_message_actions(action: &mut Value, state: &mut MigrationState) -> TransformOutcome {
    let Some(object) = action.as_object_mut() else {
        return TransformOutcome::Keep;
    };
    match object.get("name").and_then(Value::as_str) {
        Some("custom_message") => {
            let name = format!("send_{}", medium_of(object));
            object.remove("medium");
            object.insert("name".to_owned(), Value::from(name));
        }
        Some("send_message") => inline_send_message(object, state),
        _ => {}
    }
    TransformOutcome::Keep
}

fn inline_send_message(action: &mut Map<String, Value>, state: &MigrationState) {
    let message_name = match action.remove("message_name") {
        Some(Value::String(name)) => name,
        _ => String::new(),
    };
    let Some(message) = stashed_message(state, &message_name) else {
        tracing::warn!(message = %message_name, "send_message refers to a missing message");
        action.insert("name".to_owned(), Value::from("send_text"));
        return;
    };
    action.insert("name".to_owned(), Value::from(format!("send_{}", medium_of(message))));
    for (from, to) in [("from", "from_role_name"), ("content", "content")] {
        if let Some(value) = message.get(from) {
            action.insert(to.to_owned(), value.clone());
        }
    }
}

fn rename_event(event: &mut Value) {
    let Some(object) = event.as_object_mut() else {
        return;
    };
    if object.get("type").and_then(Value::as_str) == Some("message_received") {
        let renamed = format!("{}_received", medium_of(object));
        object.insert("type".to_owned(), Value::from(renamed));
        object.remove("medium");
    }
}

fn rename_received_events(trigger: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    if let Some(Value::Array(events)) = trigger.get_mut("events") {
        events.iter_mut().for_each(rename_event);
    }
    if let Some(event) = trigger.get_mut("event") {
        rename_event(event);
    }
    TransformOutcome::Keep
}

fn rename_op_tree(clause: &mut Value) {
    let Some(object) = clause.as_object_mut() else {
        return;
    };
    let renamed = match object.get("op").and_then(Value::as_str) {
        Some("message_contains") => Some("text_contains"),
        Some("message_is_affirmative") => Some("text_is_affirmative"),
        _ => None,
    };
    if let Some(op) = renamed {
        object.insert("op".to_owned(), Value::from(op));
    }
    if let Some(item) = object.get_mut("item") {
        rename_op_tree(item);
    }
    if let Some(Value::Array(items)) = object.get_mut("items") {
        items.iter_mut().for_each(rename_op_tree);
    }
}

fn rename_message_ops(clause: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    rename_op_tree(clause);
    TransformOutcome::Keep
}
