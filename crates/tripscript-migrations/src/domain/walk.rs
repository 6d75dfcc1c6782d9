//! Applies element transforms at each scope.

use serde_json::{Map, Value};

use crate::domain::{ElementTransform, MigrationState, Scope, TransformOutcome};

/// Runs `transform` over every element `scope` reaches in `root`.
pub fn apply_scope(root: &mut Map<String, Value>, scope: Scope, transform: ElementTransform, state: &mut MigrationState) {
    match scope {
        Scope::Collection(name) => {
            if let Some(Value::Array(items)) = root.get_mut(name) {
                transform_list(items, transform, state);
            }
        }
        Scope::Actions => {
            for trigger in objects_mut(root, "triggers") {
                if let Some(Value::Array(actions)) = trigger.get_mut("actions") {
                    walk_actions(actions, transform, state);
                }
            }
        }
        Scope::Panels => {
            for page in objects_mut(root, "pages") {
                if let Some(Value::Array(panels)) = page.get_mut("panels") {
                    transform_list(panels, transform, state);
                }
            }
        }
        Scope::IfClauses => {
            for scene in objects_mut(root, "scenes") {
                transform_field(scene, "active_if", transform, state);
            }
            for trigger in objects_mut(root, "triggers") {
                transform_field(trigger, "if", transform, state);
                transform_field(trigger, "active_if", transform, state);
                if let Some(Value::Array(actions)) = trigger.get_mut("actions") {
                    walk_action_ifs(actions, transform, state);
                }
            }
            for page in objects_mut(root, "pages") {
                let panels = page.get_mut("panels").and_then(Value::as_array_mut);
                for panel in panels.into_iter().flatten().filter_map(Value::as_object_mut) {
                    transform_field(panel, "visible_if", transform, state);
                }
            }
        }
    }
}

fn objects_mut<'a>(root: &'a mut Map<String, Value>, collection: &'static str) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    root.get_mut(collection)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

fn transform_list(items: &mut Vec<Value>, transform: ElementTransform, state: &mut MigrationState) {
    let mut transformed = Vec::with_capacity(items.len());
    for mut item in items.drain(..) {
        match transform(&mut item, state) {
            TransformOutcome::Keep => transformed.push(item),
            TransformOutcome::Replace(replacement) => transformed.push(replacement),
            TransformOutcome::Split(parts) => transformed.extend(parts),
            TransformOutcome::Remove => {}
        }
    }
    *items = transformed;
}

fn transform_field(object: &mut Map<String, Value>, key: &str, transform: ElementTransform, state: &mut MigrationState) {
    let outcome = match object.get_mut(key) {
        Some(value) if !value.is_null() => transform(value, state),
        _ => return,
    };
    match outcome {
        TransformOutcome::Keep => {}
        TransformOutcome::Replace(replacement) => {
            object.insert(key.to_owned(), replacement);
        }
        TransformOutcome::Remove => {
            object.remove(key);
        }
        TransformOutcome::Split(_) => {
            tracing::warn!(field = key, "split ignored outside a list");
        }
    }
}

fn is_conditional(action: &Value) -> bool {
    action.get("name").and_then(Value::as_str) == Some("conditional")
}

/// Nested action lists of a conditional node.
fn branches_mut(action: &mut Value) -> Vec<&mut Vec<Value>> {
    let Some(object) = action.as_object_mut() else {
        return Vec::new();
    };
    let mut lists = Vec::new();
    for (key, value) in object.iter_mut() {
        match (key.as_str(), value) {
            ("actions" | "else", Value::Array(list)) => lists.push(list),
            ("elseifs", Value::Array(elseifs)) => {
                for elseif in elseifs.iter_mut() {
                    if let Some(Value::Array(list)) = elseif.get_mut("actions") {
                        lists.push(list);
                    }
                }
            }
            _ => {}
        }
    }
    lists
}

fn walk_actions(actions: &mut Vec<Value>, transform: ElementTransform, state: &mut MigrationState) {
    transform_list(actions, transform, state);
    for action in actions.iter_mut().filter(|action| is_conditional(action)) {
        for list in branches_mut(action) {
            walk_actions(list, transform, state);
        }
    }
}

fn walk_action_ifs(actions: &mut [Value], transform: ElementTransform, state: &mut MigrationState) {
    for action in actions.iter_mut().filter(|action| is_conditional(action)) {
        if let Some(object) = action.as_object_mut() {
            transform_field(object, "if", transform, state);
            let elseifs = object.get_mut("elseifs").and_then(Value::as_array_mut);
            for elseif in elseifs.into_iter().flatten().filter_map(Value::as_object_mut) {
                transform_field(elseif, "if", transform, state);
            }
        }
        for list in branches_mut(action) {
            walk_action_ifs(list, transform, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(value: &mut Value, state: &mut MigrationState) -> TransformOutcome {
        if let Some(object) = value.as_object_mut() {
            object.insert("seen".to_owned(), Value::from(state.advance(1)));
        }
        TransformOutcome::Keep
    }

    fn upper(value: &mut Value, _: &mut MigrationState) -> TransformOutcome {
        match value.as_str() {
            Some(text) => TransformOutcome::Replace(Value::from(text.to_uppercase())),
            None => TransformOutcome::Keep,
        }
    }

    fn root(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_actions_walk_reaches_every_branch_in_order() {
        let mut document = root(json!({
            "triggers": [{
                "name": "t",
                "actions": [
                    {"name": "conditional", "actions": [{"name": "a"}],
                     "elseifs": [{"actions": [{"name": "b"}]}], "else": [{"name": "c"}]},
                    {"name": "d"}
                ]
            }]
        }));
        let mut state = MigrationState::default();

        apply_scope(&mut document, Scope::Actions, tag, &mut state);

        assert_eq!(state.counter, 5);
        let actions = &document["triggers"][0]["actions"];
        assert_eq!(actions[0]["seen"], 1);
        assert_eq!(actions[1]["seen"], 2);
        for nested in [&actions[0]["actions"][0], &actions[0]["elseifs"][0]["actions"][0], &actions[0]["else"][0]] {
            assert!(nested["seen"].as_u64().unwrap() > 2);
        }
    }

    #[test]
    fn test_if_clause_walk_reaches_scenes_triggers_conditionals_and_panels() {
        let mut document = root(json!({
            "scenes": [{"name": "s", "active_if": "a"}],
            "triggers": [{
                "name": "t",
                "if": "b",
                "actions": [{"name": "conditional", "if": "c", "elseifs": [{"if": "d", "actions": []}]}]
            }],
            "pages": [{"name": "p", "panels": [{"type": "text", "visible_if": "e"}]}]
        }));

        apply_scope(&mut document, Scope::IfClauses, upper, &mut MigrationState::default());

        assert_eq!(document["scenes"][0]["active_if"], "A");
        assert_eq!(document["triggers"][0]["if"], "B");
        assert_eq!(document["triggers"][0]["actions"][0]["if"], "C");
        assert_eq!(document["triggers"][0]["actions"][0]["elseifs"][0]["if"], "D");
        assert_eq!(document["pages"][0]["panels"][0]["visible_if"], "E");
    }

    #[test]
    fn test_collection_transform_can_split_and_remove() {
        fn split_pairs(value: &mut Value, _: &mut MigrationState) -> TransformOutcome {
            match value.as_u64() {
                Some(0) => TransformOutcome::Remove,
                Some(n) => TransformOutcome::Split(vec![Value::from(n), Value::from(n * 10)]),
                None => TransformOutcome::Keep,
            }
        }
        let mut document = root(json!({"cues": [1, 0, 2]}));

        apply_scope(&mut document, Scope::Collection("cues"), split_pairs, &mut MigrationState::default());

        assert_eq!(document["cues"], json!([1, 10, 2, 20]));
    }
}
