//! Whole-script validation.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::instrument;
use tripscript_core::error::{EngineError, FieldError};
use tripscript_core::script::{ScriptContent, str_field};
use tripscript_schema::{Category, Registry, Validator};

/// Validates every collection of `script`.
///
/// Returns the warnings raised by module validate hooks and by resources
/// claiming more than one scene.
///
/// # Errors
///
/// Returns `EngineError::SchemaValidation` carrying every field error when
/// any collection is unknown, any resource breaks its schema, or a name
/// repeats within a collection.
#[instrument(skip_all)]
pub fn validate_script(registry: &Registry, script: &ScriptContent) -> Result<Vec<FieldError>, EngineError> {
    let validator = Validator::new(registry, script);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (collection, resources) in script.collections() {
        if registry.lookup(Category::Resources, collection).is_err() {
            errors.push(FieldError::new(
                collection,
                format!("Collection \"{collection}\" is not a known resource type."),
            ));
            continue;
        }
        let Some(resources) = resources.as_array() else {
            errors.push(FieldError::new(
                collection,
                format!("Collection \"{collection}\" should be a list."),
            ));
            continue;
        };
        let mut seen = BTreeSet::new();
        for (index, resource) in resources.iter().enumerate() {
            let name = resource.as_object().and_then(|object| str_field(object, "name"));
            let path = match name {
                Some(name) => format!("{collection}[{name}]"),
                None => format!("{collection}[{index}]"),
            };
            if let Some(name) = name {
                if !seen.insert(name) {
                    errors.push(FieldError::new(
                        &path,
                        format!("Duplicate name \"{name}\" in collection \"{collection}\"."),
                    ));
                }
            }
            let findings = validator.check_resource(&path, collection, resource);
            errors.extend(findings.errors);
            warnings.extend(findings.warnings);
            if let Some(object) = resource.as_object() {
                warnings.extend(scene_claim_conflict(registry, collection, &path, object));
            }
        }
    }

    if errors.is_empty() {
        tracing::debug!(warnings = warnings.len(), "script is valid");
        Ok(warnings)
    } else {
        tracing::debug!(errors = errors.len(), "script failed validation");
        Err(EngineError::SchemaValidation(errors))
    }
}

/// `collection.name` resources that `resource` claims as parents.
#[must_use]
pub fn parent_claims(registry: &Registry, collection: &str, resource: &Map<String, Value>) -> Vec<String> {
    registry
        .lookup(Category::Resources, collection)
        .ok()
        .and_then(|module| module.parent_claims_hook())
        .map(|hook| hook(resource, registry))
        .unwrap_or_default()
}

fn scene_claim_conflict(
    registry: &Registry,
    collection: &str,
    path: &str,
    resource: &Map<String, Value>,
) -> Option<FieldError> {
    let scenes: Vec<String> = parent_claims(registry, collection, resource)
        .into_iter()
        .filter_map(|claim| claim.strip_prefix("scenes.").map(str::to_owned))
        .collect();
    (scenes.len() > 1).then(|| {
        let quoted: Vec<String> = scenes.iter().map(|scene| format!("\"{scene}\"")).collect();
        FieldError::new(
            path,
            format!("Resource is claimed by more than one scene: {}.", quoted.join(", ")),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;
    use serde_json::json;
    use tripscript_test_support::{ScriptBuilder, sample_script};

    fn paths(err: &EngineError) -> Vec<&str> {
        match err {
            EngineError::SchemaValidation(errors) => errors.iter().map(|e| e.path.as_str()).collect(),
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_sample_script_is_valid() {
        assert_eq!(validate_script(registry(), &sample_script()).unwrap(), Vec::new());
    }

    #[test]
    fn test_script_without_meta_or_roles_can_be_valid() {
        let script = ScriptBuilder::new()
            .with("scenes", json!({"name": "solo", "title": "Solo"}))
            .build();

        assert_eq!(validate_script(registry(), &script).unwrap(), Vec::new());
    }

    #[test]
    fn test_unknown_collection_is_an_error() {
        let script = ScriptBuilder::sample().with("ghosts", json!({"name": "casper"})).build();

        let err = validate_script(registry(), &script).unwrap_err();

        assert_eq!(paths(&err), vec!["ghosts"]);
    }

    #[test]
    fn test_duplicate_names_are_errors() {
        let script = ScriptBuilder::sample().with("cues", json!({"name": "bell", "title": "Another bell"})).build();

        match validate_script(registry(), &script) {
            Err(EngineError::SchemaValidation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "cues[bell]");
                assert_eq!(errors[0].message, "Duplicate name \"bell\" in collection \"cues\".");
            }
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_errors_name_the_property_path() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "broken",
                "event": {"type": "scene_started", "scene": "finale"},
                "actions": [
                    {"name": "conditional", "if": {"op": "value_is_true", "ref": "ready"},
                     "actions": [{"name": "start_scene", "scene_name": "epilogue"}]}
                ]
            }))
            .build();

        let err = validate_script(registry(), &script).unwrap_err();

        assert_eq!(
            paths(&err),
            vec!["triggers[broken].event.scene", "triggers[broken].actions[0].actions[0].scene_name"]
        );
    }

    #[test]
    fn test_directions_panel_warning_is_not_an_error() {
        let script = ScriptBuilder::sample()
            .with(
                "pages",
                json!({
                    "name": "map",
                    "title": "Map",
                    "scene": "manor",
                    "role": "Butler",
                    "panels": [{"type": "directions", "destination_name": "the pier"}]
                }),
            )
            .build();

        let warnings = validate_script(registry(), &script).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "pages[map].panels[0]");
        assert_eq!(warnings[0].message, "Directions panel requires either a route or a waypoint.");
    }

    #[test]
    fn test_trigger_claiming_two_scenes_warns() {
        let script = ScriptBuilder::sample()
            .trigger(json!({
                "name": "confused",
                "scene": "intro",
                "event": {"type": "scene_started", "scene": "manor"}
            }))
            .build();

        let warnings = validate_script(registry(), &script).unwrap();

        assert_eq!(
            warnings,
            vec![FieldError::new(
                "triggers[confused]",
                "Resource is claimed by more than one scene: \"intro\", \"manor\"."
            )]
        );
    }

    #[test]
    fn test_parent_claims_follow_event_parent_param() {
        let trigger = json!({"name": "t", "event": {"type": "cue_signaled", "cue": "bell"}});

        assert_eq!(
            parent_claims(registry(), "triggers", trigger.as_object().unwrap()),
            vec!["cues.bell".to_owned()]
        );
    }
}
