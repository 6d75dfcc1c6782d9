//! Makes resource names unique within each collection.

use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState};

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 8,
        name: "dedupe_resource_names",
        document: Some(dedupe),
        transforms: Vec::new(),
        fixtures: vec![Fixture::new(
            json!({
                "meta": {"version": 7},
                "cues": [{"name": "bell"}, {"name": "bell"}, {"name": "gong"}, {"name": "bell"}],
                "times": [{"name": "bell"}],
                "triggers": [{"name": "t"}, {"name": "t-2"}, {"name": "t"}]
            }),
            json!({
                "meta": {"version": 7},
                "cues": [{"name": "bell"}, {"name": "bell-2"}, {"name": "gong"}, {"name": "bell-3"}],
                "times": [{"name": "bell"}],
                "triggers": [{"name": "t"}, {"name": "t-2"}, {"name": "t-3"}]
            }),
        )],
    }
}

fn dedupe(document: &mut Map<String, Value>, state: &mut MigrationState) {
    for (collection, resources) in document.iter_mut() {
        let Value::Array(resources) = resources else {
            continue;
        };
        // Authored names win over generated suffixes.
        let authored = resources
            .iter()
            .filter_map(|resource| resource.get("name").and_then(Value::as_str))
            .map(str::to_owned);
        state.seen.entry(collection.clone()).or_default().extend(authored);

        let mut kept = BTreeSet::new();
        for resource in resources.iter_mut().filter_map(Value::as_object_mut) {
            let Some(name) = resource.get("name").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };
            if kept.insert(name.clone()) {
                continue;
            }
            let mut suffix = 2;
            let unique = loop {
                let candidate = format!("{name}-{suffix}");
                if state.claim_name(collection, &candidate) {
                    break candidate;
                }
                suffix += 1;
            };
            tracing::debug!(%collection, from = %name, to = %unique, "renamed duplicate resource");
            kept.insert(unique.clone());
            resource.insert("name".to_owned(), Value::from(unique));
        }
    }
}
