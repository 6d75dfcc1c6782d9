//! Drops relay fields that moved to the phone gateway configuration.

use serde_json::{Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

const RETIRED_FIELDS: [&str; 6] = ["admin_out", "phone_out", "phone_in", "phone_autoreply", "sms_out", "sms_in"];

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 6,
        name: "relay_legacy_fields_rm",
        document: None,
        transforms: vec![(Scope::Collection("relays"), strip_fields)],
        fixtures: vec![Fixture::new(
            json!({
                "relays": [{
                    "name": "butler_line", "for": "Butler", "as": "Butler", "with": "Detective",
                    "admin_out": true, "phone_out": true, "phone_in": false,
                    "phone_autoreply": "Leave a message.", "sms_out": true, "sms_in": true
                }]
            }),
            json!({
                "relays": [{"name": "butler_line", "for": "Butler", "as": "Butler", "with": "Detective"}]
            }),
        )],
    }
}

fn strip_fields(relay: &mut Value, _: &mut MigrationState) -> TransformOutcome {
    if let Some(object) = relay.as_object_mut() {
        for field in RETIRED_FIELDS {
            object.remove(field);
        }
    }
    TransformOutcome::Keep
}
