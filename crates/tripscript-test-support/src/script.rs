//! Script fixtures.

use serde_json::{Map, Value, json};
use tripscript_core::script::ScriptContent;

/// Assembles script content collection by collection.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    root: Map<String, Value>,
}

impl ScriptBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the sample script.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            root: sample_script().as_map().clone(),
        }
    }

    /// Appends a resource to `collection`.
    #[must_use]
    pub fn with(mut self, collection: &str, resource: Value) -> Self {
        let entry = self
            .root
            .entry(collection.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(resource);
        }
        self
    }

    /// Appends a trigger.
    #[must_use]
    pub fn trigger(self, trigger: Value) -> Self {
        self.with("triggers", trigger)
    }

    #[must_use]
    pub fn build(self) -> ScriptContent {
        ScriptContent::new(self.root)
    }
}

/// A small, valid two-role mystery script.
///
/// Scenes `intro` and `manor`, plus the global `radio`. Roles `Detective`
/// and `Butler`. Manor pages `gate` and `hall` belong to the Detective,
/// `pantry` to the Butler. One cue (`bell`), one time (`dinner`), and no
/// triggers.
#[must_use]
pub fn sample_script() -> ScriptContent {
    let root = json!({
        "meta": {"version": 11},
        "scenes": [
            {"name": "intro", "title": "Intro"},
            {"name": "manor", "title": "Manor"},
            {"name": "radio", "title": "Radio", "global": true}
        ],
        "roles": [
            {"name": "Detective", "title": "Detective"},
            {"name": "Butler", "title": "Butler"}
        ],
        "pages": [
            {
                "name": "gate",
                "title": "Gate",
                "scene": "manor",
                "role": "Detective",
                "panels": [{"type": "text", "text": "You stand at the **gate**."}]
            },
            {"name": "hall", "title": "Hall", "scene": "manor", "role": "Detective"},
            {"name": "pantry", "title": "Pantry", "scene": "manor", "role": "Butler"}
        ],
        "cues": [{"name": "bell", "title": "Bell"}],
        "times": [{"name": "dinner", "title": "Dinner"}]
    });
    match root {
        Value::Object(root) => ScriptContent::new(root),
        _ => ScriptContent::default(),
    }
}
