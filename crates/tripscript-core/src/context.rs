//! Evaluation context: the read-only snapshot of live state supplied to
//! each evaluation call.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::Event;
use crate::instruction::Instruction;
use crate::lookup;
use crate::script::ScriptContent;

/// Playback state of one role's foreground audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioState {
    /// Media url being played.
    pub audio: String,
    /// Whether playback is running.
    pub is_playing: bool,
    /// When playback last (re)started.
    pub started_at: DateTime<Utc>,
    /// Milliseconds already played before `started_at`.
    pub started_elapsed_ms: i64,
    /// When playback was paused, if paused.
    pub paused_at: Option<DateTime<Utc>>,
}

/// Runtime state of a trip, replaced wholesale by `UpdateTripState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripState {
    /// Name of the current scene.
    pub current_scene_name: Option<String>,
    /// Page shown to each role.
    pub current_page_names_by_role: BTreeMap<String, String>,
    /// Audio playback per role.
    pub audio_state_by_role: BTreeMap<String, AudioState>,
}

/// Snapshot of live trip and player state for one evaluation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationContext {
    /// Trip values, addressed by value refs.
    pub values: Map<String, Value>,
    /// Trip runtime state.
    pub trip_state: TripState,
    /// Named times to timestamps.
    pub schedule: BTreeMap<String, DateTime<Utc>>,
    /// Trigger name to the time it last fired.
    pub history: BTreeMap<String, DateTime<Utc>>,
    /// Role of the player the event came from, if any.
    pub current_role_name: Option<String>,
    /// Player values per role.
    pub player_values: BTreeMap<String, Map<String, Value>>,
    /// Display timezone for templated times; UTC when absent.
    #[serde(skip)]
    pub timezone: Option<FixedOffset>,
}

impl EvaluationContext {
    /// Returns the current scene name.
    #[must_use]
    pub fn current_scene_name(&self) -> Option<&str> {
        self.trip_state.current_scene_name.as_deref()
    }

    /// Resolves a dotted path against live state.
    ///
    /// The first segment selects the root: `event`, `schedule`, `history`,
    /// `player` (the current role), a role name, or otherwise a trip value.
    /// Missing paths resolve to null.
    #[must_use]
    pub fn lookup_path(&self, path: &str, event: Option<&Event>) -> Value {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let root = match head {
            "event" => event.map(Event::to_value),
            "schedule" => serde_json::to_value(&self.schedule).ok(),
            "history" => serde_json::to_value(&self.history).ok(),
            "player" => self
                .current_role_name
                .as_ref()
                .and_then(|role| self.player_values.get(role))
                .map(|values| Value::Object(values.clone())),
            _ if rest.is_some() && self.player_values.contains_key(head) => self
                .player_values
                .get(head)
                .map(|values| Value::Object(values.clone())),
            _ => {
                return lookup::walk_path(self.values.get(head), rest);
            }
        };
        lookup::walk_path(root.as_ref(), rest)
    }

    /// Folds a provisional instruction into this snapshot so that a
    /// cascading evaluation observes the effects of earlier triggers.
    /// Instructions with no bearing on evaluation are ignored.
    pub fn absorb(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::UpdateTripState { state } => self.trip_state = state.clone(),
            Instruction::UpdateTripValues { values } => {
                for (path, value) in values {
                    lookup::set_path(&mut self.values, path, value.clone());
                }
            }
            Instruction::UpdatePlayerState { role_name, values } => {
                let player = self.player_values.entry(role_name.clone()).or_default();
                for (path, value) in values {
                    lookup::set_path(player, path, value.clone());
                }
            }
            Instruction::UpdateTripHistory { history } => {
                for (name, at) in history {
                    self.history.insert(name.clone(), *at);
                }
            }
            Instruction::UpdateTripFields { fields } => self.absorb_trip_fields(fields),
            _ => {}
        }
    }

    /// Replaces whole trip fields. Unknown fields and fields that do not
    /// deserialize are ignored.
    fn absorb_trip_fields(&mut self, fields: &Map<String, Value>) {
        for (field, value) in fields {
            match field.as_str() {
                "values" => {
                    if let Value::Object(values) = value {
                        self.values = values.clone();
                    }
                }
                "trip_state" => {
                    if let Ok(state) = serde_json::from_value(value.clone()) {
                        self.trip_state = state;
                    }
                }
                "schedule" => {
                    if let Ok(schedule) = serde_json::from_value(value.clone()) {
                        self.schedule = schedule;
                    }
                }
                "history" => {
                    if let Ok(history) = serde_json::from_value(value.clone()) {
                        self.history = history;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Everything an action or event module may consult while running.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// The validated script.
    pub script: &'a ScriptContent,
    /// The live state snapshot.
    pub evaluation: &'a EvaluationContext,
    /// The event being processed, if any.
    pub event: Option<&'a Event>,
    /// Logical apply timestamp.
    pub evaluate_at: DateTime<Utc>,
}

impl<'a> ActionContext<'a> {
    /// Creates a context with no triggering event.
    #[must_use]
    pub fn new(
        script: &'a ScriptContent,
        evaluation: &'a EvaluationContext,
        evaluate_at: DateTime<Utc>,
    ) -> Self {
        Self {
            script,
            evaluation,
            event: None,
            evaluate_at,
        }
    }

    /// Attaches the triggering event.
    #[must_use]
    pub fn with_event(mut self, event: &'a Event) -> Self {
        self.event = Some(event);
        self
    }

    /// Resolves a value ref or literal.
    #[must_use]
    pub fn lookup_ref(&self, reference: &Value) -> Value {
        lookup::lookup_ref(self.evaluation, self.event, reference)
    }

    /// Interpolates `{{ref}}` and `{% if ref %}` blocks in `text`.
    #[must_use]
    pub fn template(&self, text: &str) -> String {
        lookup::template_text(self.evaluation, self.event, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn context() -> EvaluationContext {
        let mut context = EvaluationContext {
            values: json!({"clues": {"found": 3}, "door": "open"})
                .as_object()
                .cloned()
                .unwrap(),
            current_role_name: Some("Detective".to_owned()),
            ..EvaluationContext::default()
        };
        context.player_values.insert(
            "Detective".to_owned(),
            json!({"mood": "curious"}).as_object().cloned().unwrap(),
        );
        context
    }

    #[test]
    fn test_lookup_path_reads_nested_trip_values() {
        assert_eq!(context().lookup_path("clues.found", None), json!(3));
        assert_eq!(context().lookup_path("door", None), json!("open"));
        assert_eq!(context().lookup_path("clues.missing", None), Value::Null);
    }

    #[test]
    fn test_lookup_path_reads_player_and_role_values() {
        assert_eq!(context().lookup_path("player.mood", None), json!("curious"));
        assert_eq!(context().lookup_path("Detective.mood", None), json!("curious"));
    }

    #[test]
    fn test_lookup_path_reads_event_fields() {
        let event = Event::new("text_received").with("content", "hello");

        assert_eq!(
            context().lookup_path("event.content", Some(&event)),
            json!("hello")
        );
        assert_eq!(context().lookup_path("event.content", None), Value::Null);
    }

    #[test]
    fn test_absorb_merges_values_and_history() {
        let mut context = context();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        context.absorb(&Instruction::UpdateTripValues {
            values: json!({"door": "closed", "clues.hidden": 1})
                .as_object()
                .cloned()
                .unwrap(),
        });
        context.absorb(&Instruction::UpdateTripHistory {
            history: BTreeMap::from([("knock".to_owned(), at)]),
        });

        assert_eq!(context.values["door"], json!("closed"));
        assert_eq!(context.values["clues"], json!({"found": 3, "hidden": 1}));
        assert_eq!(context.history.get("knock"), Some(&at));
    }

    #[test]
    fn test_absorb_replaces_whole_trip_fields() {
        let mut context = context();
        let dinner = Utc.with_ymd_and_hms(2026, 1, 15, 19, 0, 0).unwrap();

        context.absorb(&Instruction::UpdateTripFields {
            fields: json!({
                "schedule": {"dinner": "2026-01-15T19:00:00Z"},
                "trip_state": {"current_scene_name": "manor"},
                "history": "not a map",
                "customizations": {"ignored": true}
            })
            .as_object()
            .cloned()
            .unwrap(),
        });

        assert_eq!(context.schedule, BTreeMap::from([("dinner".to_owned(), dinner)]));
        assert_eq!(context.current_scene_name(), Some("manor"));
        assert!(context.history.is_empty());
        assert_eq!(context.values["door"], json!("open"));
    }
}
