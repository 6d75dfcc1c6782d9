//! Resource types, one per script collection.

use serde_json::Value;
use tripscript_core::script::{ScriptContent, str_field};
use tripscript_schema::registry::{Params, ParentClaimsHook};
use tripscript_schema::{Category, ModuleDefinition, ModuleHooks, PropertySpec, Registry};

fn resource(collection: &'static str, help: &'static str, properties: Vec<(&'static str, PropertySpec)>) -> ModuleDefinition {
    ModuleDefinition::new(collection, help, properties, ModuleHooks::Resource { parent_claims: None })
}

fn claimed(
    collection: &'static str,
    help: &'static str,
    properties: Vec<(&'static str, PropertySpec)>,
    hook: ParentClaimsHook,
) -> ModuleDefinition {
    ModuleDefinition::new(collection, help, properties, ModuleHooks::Resource { parent_claims: Some(hook) })
}

fn named() -> (&'static str, PropertySpec) {
    ("name", PropertySpec::name().required())
}

fn titled() -> (&'static str, PropertySpec) {
    ("title", PropertySpec::string().required())
}

#[must_use]
pub fn definitions() -> Vec<ModuleDefinition> {
    vec![
        resource(
            "scenes",
            "A phase of the experience; triggers and pages belong to scenes.",
            vec![
                named(),
                titled(),
                ("global", PropertySpec::boolean().with_default(false).with_help("Global scenes run alongside the current scene.")),
                ("active_if", PropertySpec::if_clause().with_help("When a global scene is live.")),
            ],
        )
        .with_title(resource_title),
        resource(
            "roles",
            "A participant or character.",
            vec![
                named(),
                titled(),
                ("email", PropertySpec::email()),
                ("actor", PropertySpec::boolean().with_default(false)),
            ],
        )
        .with_title(resource_title),
        resource("cues", "A named signal that triggers can listen for.", vec![named(), titled()]).with_title(resource_title),
        resource("times", "A named time filled in by the schedule.", vec![named(), titled()]).with_title(resource_title),
        resource(
            "geofences",
            "A circular area around a point.",
            vec![
                named(),
                titled(),
                ("center", PropertySpec::coordinates().required()),
                ("distance", PropertySpec::number().required().with_help("Radius in meters.")),
            ],
        )
        .with_title(resource_title),
        resource(
            "waypoints",
            "A location used in directions.",
            vec![
                named(),
                titled(),
                ("coords", PropertySpec::coordinates().required()),
                ("address", PropertySpec::string()),
            ],
        )
        .with_title(resource_title),
        resource(
            "routes",
            "A path between two waypoints.",
            vec![
                named(),
                titled(),
                ("from", PropertySpec::reference("waypoints").required()),
                ("to", PropertySpec::reference("waypoints").required()),
                ("mode", PropertySpec::one_of(&["walking", "driving", "cycling"]).with_default("walking")),
            ],
        )
        .with_title(resource_title),
        resource(
            "relays",
            "Forwards calls and messages between roles.",
            vec![
                named(),
                ("for", PropertySpec::reference("roles").required()),
                ("as", PropertySpec::reference("roles").required()),
                ("with", PropertySpec::reference("roles").required()),
                ("entryway", PropertySpec::boolean().with_default(false)),
            ],
        ),
        resource(
            "clips",
            "A recorded or synthesized piece of audio.",
            vec![
                named(),
                titled(),
                ("transcript", PropertySpec::string()),
                ("audio", PropertySpec::media()),
                ("voice", PropertySpec::one_of(&["alice", "man", "woman"]).with_default("alice")),
            ],
        )
        .with_title(resource_title),
        claimed(
            "pages",
            "What one role sees during a scene.",
            vec![
                named(),
                titled(),
                ("scene", PropertySpec::reference("scenes").required()),
                ("role", PropertySpec::reference("roles").required()),
                ("panels", PropertySpec::list(PropertySpec::component(Category::Panels))),
            ],
            page_parent_claims,
        )
        .with_title(resource_title),
        claimed(
            "triggers",
            "Runs actions when an event occurs.",
            vec![
                named(),
                ("title", PropertySpec::string()),
                ("scene", PropertySpec::reference("scenes").with_help("Trigger only fires while this scene is live.")),
                ("event", PropertySpec::component(Category::Events).required()),
                ("if", PropertySpec::if_clause()),
                ("actions", PropertySpec::actions()),
            ],
            trigger_parent_claims,
        )
        .with_title(trigger_title),
    ]
}

fn resource_title(resource: &Params, _: &ScriptContent) -> String {
    str_field(resource, "title")
        .or_else(|| str_field(resource, "name"))
        .unwrap_or_default()
        .to_owned()
}

fn trigger_title(resource: &Params, _: &ScriptContent) -> String {
    if let Some(title) = str_field(resource, "title") {
        return title.to_owned();
    }
    let event = resource
        .get("event")
        .and_then(|event| event.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("event");
    format!("on {}", event.replace('_', " "))
}

fn page_parent_claims(resource: &Params, _: &Registry) -> Vec<String> {
    str_field(resource, "scene")
        .map(|scene| vec![format!("scenes.{scene}")])
        .unwrap_or_default()
}

fn trigger_parent_claims(resource: &Params, registry: &Registry) -> Vec<String> {
    let mut claims = Vec::new();
    if let Some(scene) = str_field(resource, "scene") {
        claims.push(format!("scenes.{scene}"));
    }
    let Some(event) = resource.get("event").and_then(Value::as_object) else {
        return claims;
    };
    let event_type = str_field(event, "type").unwrap_or_default();
    let parent = registry
        .lookup(Category::Events, event_type)
        .ok()
        .and_then(|module| module.parent_param());
    if let Some((param, collection)) = parent {
        if let Some(name) = str_field(event, param) {
            let claim = format!("{collection}.{name}");
            if !claims.contains(&claim) {
                claims.push(claim);
            }
        }
    }
    claims
}
