//! Recursive validation of values against property schemas.
//!
//! A single visitor dispatches over `PropertyKind`. Composite kinds recurse
//! with extended paths (`name[i]`, `name[key]`, `prefix.member`); references
//! resolve against the full script content; components resolve through the
//! registry.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tripscript_core::error::FieldError;
use tripscript_core::script::ScriptContent;
use tripscript_core::time::is_time_offset;

use crate::property::{PropertyKind, PropertySpec};
use crate::registry::{Category, Registry};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid regex"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

static TEMPLATE_MEDIA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*[\w\-.:]+\s*\}\}$").expect("valid regex"));

static ATTRIBUTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][\w-]*(\.[\w-]+)*$").expect("valid regex"));

/// Errors and warnings collected by one validation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Findings {
    /// Violations of the schema.
    pub errors: Vec<FieldError>,
    /// Advisory problems raised by module validate hooks.
    pub warnings: Vec<FieldError>,
}

impl Findings {
    fn error(&mut self, path: &str, message: String) {
        self.errors.push(FieldError::new(path, message));
    }
}

/// Validates values against schemas in the context of one script.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a Registry,
    script: &'a ScriptContent,
}

impl<'a> Validator<'a> {
    /// Creates a validator resolving references against `script`.
    #[must_use]
    pub fn new(registry: &'a Registry, script: &'a ScriptContent) -> Self {
        Self { registry, script }
    }

    /// Validates `value` (absent when `None`) against `spec`, returning the
    /// field errors found.
    #[must_use]
    pub fn validate(&self, path: &str, spec: &PropertySpec, value: Option<&Value>) -> Vec<FieldError> {
        self.check(path, spec, value).errors
    }

    /// Like [`Validator::validate`], also collecting warnings.
    #[must_use]
    pub fn check(&self, path: &str, spec: &PropertySpec, value: Option<&Value>) -> Findings {
        let mut findings = Findings::default();
        self.visit(path, spec, value, &mut findings);
        findings
    }

    /// Validates an object against named properties, flagging unexpected keys.
    #[must_use]
    pub fn check_properties(
        &self,
        prefix: &str,
        properties: &[(&'static str, PropertySpec)],
        object: &Map<String, Value>,
    ) -> Findings {
        let mut findings = Findings::default();
        self.visit_properties(prefix, properties, object, &mut findings);
        findings
    }

    /// Validates a resource of `collection`, including its validate hook.
    #[must_use]
    pub fn check_resource(&self, path: &str, collection: &str, resource: &Value) -> Findings {
        let mut findings = Findings::default();
        self.visit_resource(path, collection, resource, &mut findings);
        findings
    }

    fn visit(&self, path: &str, spec: &PropertySpec, value: Option<&Value>, out: &mut Findings) {
        let value = match value {
            None | Some(Value::Null) => {
                let nullable = matches!(spec.kind, PropertyKind::Reference { nullable: true, .. });
                if spec.required && !(nullable && value.is_some()) {
                    out.error(path, format!("Required param \"{path}\" not present."));
                }
                return;
            }
            Some(value) => value,
        };
        let label = spec.label();
        match &spec.kind {
            PropertyKind::String | PropertyKind::Markdown => {
                visit_text(path, label, spec.required, value, out);
            }
            PropertyKind::Name => visit_name(path, value, out),
            PropertyKind::Email => {
                if let Some(text) = expect_string(path, label, value, out) {
                    if !EMAIL_PATTERN.is_match(text) {
                        out.error(path, format!("Email param \"{path}\" (\"{text}\") is not a valid email."));
                    }
                }
            }
            PropertyKind::Media => {
                if let Some(text) = expect_string(path, label, value, out) {
                    let is_url = text.starts_with("http://") || text.starts_with("https://");
                    if !is_url && !TEMPLATE_MEDIA_PATTERN.is_match(text) {
                        out.error(
                            path,
                            format!("Media param \"{path}\" (\"{text}\") should be a url or a {{{{template}}}}."),
                        );
                    }
                }
            }
            PropertyKind::Number => {
                if !value.is_number() {
                    out.error(path, format!("Number param \"{path}\" should be a number."));
                }
            }
            PropertyKind::Integer => {
                if value.as_i64().is_none() {
                    out.error(path, format!("Integer param \"{path}\" should be a whole number."));
                }
            }
            PropertyKind::Boolean => {
                if !value.is_boolean() {
                    out.error(path, format!("Boolean param \"{path}\" should be either true or false."));
                }
            }
            PropertyKind::Enum(options) => {
                let known = value.as_str().is_some_and(|v| options.contains(&v));
                if !known {
                    let quoted: Vec<String> = options.iter().map(|o| format!("\"{o}\"")).collect();
                    out.error(path, format!("Enum param \"{path}\" is not one of {}.", quoted.join(", ")));
                }
            }
            PropertyKind::CoordinatePair => {
                let in_range = |v: &Value| v.as_f64().is_some_and(|n| (-180.0..=180.0).contains(&n));
                let valid = value
                    .as_array()
                    .is_some_and(|pair| pair.len() == 2 && pair.iter().all(in_range));
                if !valid {
                    out.error(
                        path,
                        format!("Coords param \"{path}\" should be two numbers between -180 and 180."),
                    );
                }
            }
            PropertyKind::Reference {
                collection,
                special_values,
                ..
            } => self.visit_reference(path, collection, special_values, value, out),
            PropertyKind::NestedResource(collection) => self.visit_resource(path, collection, value, out),
            PropertyKind::List(items) => match value.as_array() {
                Some(list) => {
                    for (i, item) in list.iter().enumerate() {
                        self.visit(&format!("{path}[{i}]"), items, Some(item), out);
                    }
                }
                None => out.error(path, format!("List param \"{path}\" should be an array.")),
            },
            PropertyKind::Dictionary { keys, values } => match value.as_object() {
                Some(object) => {
                    for (key, item) in object {
                        let entry_path = format!("{path}[{key}]");
                        self.visit(&entry_path, keys, Some(&Value::String(key.clone())), out);
                        self.visit(&entry_path, values, Some(item), out);
                    }
                }
                None => out.error(path, format!("Dictionary param \"{path}\" should be an object.")),
            },
            PropertyKind::Object(properties) => match value.as_object() {
                Some(object) => self.visit_properties(path, properties, object, out),
                None => out.error(path, format!("Object param \"{path}\" should be an object.")),
            },
            PropertyKind::Component(category) => self.visit_component(path, *category, value, out),
            PropertyKind::IfClause => self.visit_component(path, Category::Conditions, value, out),
            PropertyKind::SimpleValue | PropertyKind::Lookupable => {
                if !(value.is_string() || value.is_number() || value.is_boolean()) {
                    out.error(
                        path,
                        format!("{label} param \"{path}\" should be a string, number or boolean."),
                    );
                }
            }
            PropertyKind::SimpleAttribute => {
                if let Some(text) = expect_string(path, label, value, out) {
                    if !ATTRIBUTE_PATTERN.is_match(text) {
                        out.error(
                            path,
                            format!("Attribute param \"{path}\" (\"{text}\") should be a dotted identifier."),
                        );
                    }
                }
            }
            PropertyKind::TimeOffset => {
                if let Some(text) = expect_string(path, label, value, out) {
                    if !is_time_offset(text) {
                        out.error(
                            path,
                            format!(
                                "Time offset param \"{path}\" (\"{text}\") should be a number suffixed by \"h\", \"m\" or \"s\"."
                            ),
                        );
                    }
                }
            }
        }
    }

    fn visit_reference(
        &self,
        path: &str,
        collection: &str,
        special_values: &[&str],
        value: &Value,
        out: &mut Findings,
    ) {
        let Some(text) = expect_string(path, "Reference", value, out) else {
            return;
        };
        if special_values.contains(&text) {
            return;
        }
        if !text.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.error(path, format!("Reference param \"{path}\" (\"{text}\") should start with a letter."));
        } else if !NAME_PATTERN.is_match(text) {
            out.error(
                path,
                format!("Reference param \"{path}\" (\"{text}\") should be alphanumeric with dashes or underscores."),
            );
        } else if !self.script.contains(collection, text) {
            out.error(
                path,
                format!("Reference param \"{path}\" (\"{text}\") is not in collection \"{collection}\"."),
            );
        }
    }

    fn visit_properties(
        &self,
        prefix: &str,
        properties: &[(&'static str, PropertySpec)],
        object: &Map<String, Value>,
        out: &mut Findings,
    ) {
        for (key, spec) in properties {
            self.visit(&join(prefix, key), spec, object.get(*key), out);
        }
        for key in object.keys() {
            if !properties.iter().any(|(name, _)| name == key) {
                let expected: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
                out.error(
                    &join(prefix, key),
                    format!(
                        "Unexpected param \"{}\" (expected one of: {}).",
                        join(prefix, key),
                        expected.join(", ")
                    ),
                );
            }
        }
    }

    fn visit_component(&self, path: &str, category: Category, value: &Value, out: &mut Findings) {
        let Some(object) = value.as_object() else {
            out.error(path, format!("Component param \"{path}\" should be an object."));
            return;
        };
        let key = category.discriminant();
        let Some(variant) = object.get(key).and_then(Value::as_str) else {
            let key_path = join(path, key);
            out.error(&key_path, format!("Required param \"{key_path}\" not present."));
            return;
        };
        let Ok(module) = self.registry.lookup(category, variant) else {
            out.error(path, format!("\"{variant}\" is not one of the \"{category}\" components."));
            return;
        };
        let properties = self.registry.component_properties(module);
        self.visit_properties(path, &properties, object, out);
        if let Some(hook) = module.validate {
            for warning in hook(object, self.script) {
                out.warnings.push(FieldError::new(path, warning));
            }
        }
    }

    fn visit_resource(&self, path: &str, collection: &str, value: &Value, out: &mut Findings) {
        let Ok(module) = self.registry.lookup(Category::Resources, collection) else {
            out.error(path, format!("Collection \"{collection}\" is not a known resource type."));
            return;
        };
        let Some(object) = value.as_object() else {
            out.error(path, format!("Resource param \"{path}\" should be an object."));
            return;
        };
        self.visit_properties(path, &module.properties, object, out);
        if let Some(hook) = module.validate {
            for warning in hook(object, self.script) {
                out.warnings.push(FieldError::new(path, warning));
            }
        }
    }
}

fn expect_string<'v>(path: &str, label: &str, value: &'v Value, out: &mut Findings) -> Option<&'v str> {
    let text = value.as_str();
    if text.is_none() {
        out.error(path, format!("{label} param \"{path}\" should be a string."));
    }
    text
}

fn visit_text(path: &str, label: &str, required: bool, value: &Value, out: &mut Findings) {
    if let Some(text) = expect_string(path, label, value, out) {
        if required && text.trim().is_empty() {
            out.error(path, format!("{label} param \"{path}\" should not be blank."));
        }
    }
}

fn visit_name(path: &str, value: &Value, out: &mut Findings) {
    let Some(text) = expect_string(path, "Name", value, out) else {
        return;
    };
    if !text.starts_with(|c: char| c.is_ascii_alphabetic()) {
        out.error(path, format!("Name param \"{path}\" (\"{text}\") should start with a letter."));
    } else if !NAME_PATTERN.is_match(text) {
        out.error(
            path,
            format!("Name param \"{path}\" (\"{text}\") should be alphanumeric with dashes or underscores."),
        );
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModuleDefinition, ModuleHooks};
    use serde_json::json;
    use tripscript_core::condition::ConditionScope;
    use tripscript_core::error::EngineError;

    fn always(_: &Map<String, Value>, _: &dyn ConditionScope) -> Result<bool, EngineError> {
        Ok(true)
    }

    fn needs_route(params: &Map<String, Value>, _: &ScriptContent) -> Vec<String> {
        if params.contains_key("route") {
            Vec::new()
        } else {
            vec!["Directions panel requires a route.".to_owned()]
        }
    }

    fn registry() -> Registry {
        Registry::new(
            vec![
                ModuleDefinition::new(
                    "scenes",
                    "Scenes.",
                    vec![("name", PropertySpec::name().required()), ("title", PropertySpec::string())],
                    ModuleHooks::Resource { parent_claims: None },
                ),
                ModuleDefinition::new(
                    "value_is_true",
                    "Truthiness.",
                    vec![("ref", PropertySpec::lookupable().required())],
                    ModuleHooks::Condition { eval: always },
                ),
                ModuleDefinition::new(
                    "directions",
                    "Directions.",
                    vec![("route", PropertySpec::string())],
                    ModuleHooks::Panel,
                )
                .with_validate(needs_route),
            ],
            vec![(Category::Panels, vec![("visible_if", PropertySpec::if_clause())])],
        )
    }

    fn script() -> ScriptContent {
        ScriptContent::from_value(json!({"scenes": [{"name": "intro"}]})).unwrap()
    }

    fn messages(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_required_property_missing() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let errors = validator.validate("title", &PropertySpec::string().required(), None);

        assert_eq!(messages(&errors), vec!["Required param \"title\" not present."]);
    }

    #[test]
    fn test_required_string_must_not_be_blank() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let errors = validator.validate("title", &PropertySpec::string().required(), Some(&json!("  ")));

        assert_eq!(messages(&errors), vec!["String param \"title\" should not be blank."]);
    }

    #[test]
    fn test_enum_lists_options() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let errors = validator.validate("level", &PropertySpec::one_of(&["info", "warn"]), Some(&json!("loud")));

        assert_eq!(messages(&errors), vec!["Enum param \"level\" is not one of \"info\", \"warn\"."]);
    }

    #[test]
    fn test_reference_outside_collection_reports_exactly_one_error() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);
        let spec = PropertySpec::reference("scenes").required();

        assert!(validator.validate("scene_name", &spec, Some(&json!("intro"))).is_empty());
        let errors = validator.validate("scene_name", &spec, Some(&json!("finale")));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "scene_name");
        assert_eq!(
            errors[0].message,
            "Reference param \"scene_name\" (\"finale\") is not in collection \"scenes\"."
        );
    }

    #[test]
    fn test_reference_special_values_and_nullability() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let special = PropertySpec::reference_or("scenes", &["none"]).required();
        assert!(validator.validate("s", &special, Some(&json!("none"))).is_empty());

        let nullable = PropertySpec::nullable_reference("scenes").required();
        assert!(validator.validate("s", &nullable, Some(&Value::Null)).is_empty());
        assert_eq!(validator.validate("s", &nullable, None).len(), 1);
    }

    #[test]
    fn test_reference_must_start_with_letter() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let errors = validator.validate("s", &PropertySpec::reference("scenes"), Some(&json!("1st")));

        assert_eq!(
            messages(&errors),
            vec!["Reference param \"s\" (\"1st\") should start with a letter."]
        );
    }

    #[test]
    fn test_list_and_object_paths_nest() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);
        let spec = PropertySpec::list(PropertySpec::object(vec![
            ("value", PropertySpec::string().required()),
            ("text", PropertySpec::string()),
        ]));

        let errors = validator.validate(
            "choices",
            &spec,
            Some(&json!([{"value": "a"}, {"text": "B", "color": "red"}])),
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Required param \"choices[1].value\" not present.",
                "Unexpected param \"choices[1].color\" (expected one of: value, text).",
            ]
        );
    }

    #[test]
    fn test_dictionary_validates_keys_and_values() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);
        let spec = PropertySpec::dictionary(PropertySpec::reference("scenes"), PropertySpec::number());

        let errors = validator.validate("weights", &spec, Some(&json!({"intro": 1, "outro": "x"})));

        assert_eq!(
            messages(&errors),
            vec![
                "Reference param \"weights[outro]\" (\"outro\") is not in collection \"scenes\".",
                "Number param \"weights[outro]\" should be a number.",
            ]
        );
    }

    #[test]
    fn test_component_with_unknown_discriminant() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let errors = validator.validate("if", &PropertySpec::if_clause(), Some(&json!({"op": "maybe"})));

        assert_eq!(messages(&errors), vec!["\"maybe\" is not one of the \"conditions\" components."]);
    }

    #[test]
    fn test_component_merges_category_defaults_and_runs_hook() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);
        let panel = json!({
            "type": "directions",
            "visible_if": {"op": "value_is_true", "ref": "ready"}
        });

        let findings = validator.check("panels[0]", &PropertySpec::component(Category::Panels), Some(&panel));

        assert!(findings.errors.is_empty());
        assert_eq!(messages(&findings.warnings), vec!["Directions panel requires a route."]);
    }

    #[test]
    fn test_media_accepts_urls_and_templates() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);
        let spec = PropertySpec::media();

        assert!(validator.validate("audio", &spec, Some(&json!("https://x.test/a.mp3"))).is_empty());
        assert!(validator.validate("audio", &spec, Some(&json!("{{ intro_audio }}"))).is_empty());
        assert_eq!(validator.validate("audio", &spec, Some(&json!("a.mp3"))).len(), 1);
    }

    #[test]
    fn test_coordinates_must_be_two_numbers_in_range() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);
        let spec = PropertySpec::coordinates();

        assert!(validator.validate("center", &spec, Some(&json!([37.7, -122.4]))).is_empty());
        assert_eq!(validator.validate("center", &spec, Some(&json!([37.7]))).len(), 1);
        assert_eq!(validator.validate("center", &spec, Some(&json!([200, 0]))).len(), 1);
    }

    #[test]
    fn test_nested_resource_uses_resource_schema() {
        let (registry, script) = (registry(), script());
        let validator = Validator::new(&registry, &script);

        let errors = validator.validate("scene", &PropertySpec::nested("scenes"), Some(&json!({"title": "x"})));

        assert_eq!(messages(&errors), vec!["Required param \"scene.name\" not present."]);
    }
}
