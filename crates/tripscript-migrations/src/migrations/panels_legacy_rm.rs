//! Prunes panel types that players can no longer render.

use serde_json::{Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

const RETIRED_PANELS: [&str; 2] = ["current_page", "html"];

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 7,
        name: "panels_legacy_rm",
        document: None,
        transforms: vec![(Scope::Panels, prune_retired)],
        fixtures: vec![Fixture::new(
            json!({
                "pages": [
                    {"name": "gate", "panels": [
                        {"type": "current_page"},
                        {"type": "text", "text": "The gate is locked."},
                        {"type": "html", "html": "<b>old</b>"}
                    ]},
                    {"name": "hall"}
                ]
            }),
            json!({
                "pages": [
                    {"name": "gate", "panels": [{"type": "text", "text": "The gate is locked."}]},
                    {"name": "hall"}
                ]
            }),
        )],
    }
}

fn prune_retired(panel: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    match panel.get("type").and_then(Value::as_str) {
        Some(kind) if RETIRED_PANELS.contains(&kind) => TransformOutcome::Remove,
        _ => TransformOutcome::Keep,
    }
}
