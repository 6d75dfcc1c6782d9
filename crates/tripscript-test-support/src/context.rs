//! Builder for evaluation contexts.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tripscript_core::context::EvaluationContext;

/// Fluent construction of an `EvaluationContext`.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    context: EvaluationContext,
}

impl ContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scene(mut self, scene_name: &str) -> Self {
        self.context.trip_state.current_scene_name = Some(scene_name.to_owned());
        self
    }

    /// Sets a trip value. Dotted keys are stored as written.
    #[must_use]
    pub fn value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.values.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn player_value(mut self, role_name: &str, key: &str, value: impl Into<Value>) -> Self {
        self.context
            .player_values
            .entry(role_name.to_owned())
            .or_insert_with(Map::new)
            .insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn current_role(mut self, role_name: &str) -> Self {
        self.context.current_role_name = Some(role_name.to_owned());
        self
    }

    #[must_use]
    pub fn scheduled(mut self, time_name: &str, at: DateTime<Utc>) -> Self {
        self.context.schedule.insert(time_name.to_owned(), at);
        self
    }

    #[must_use]
    pub fn fired(mut self, trigger_name: &str, at: DateTime<Utc>) -> Self {
        self.context.history.insert(trigger_name.to_owned(), at);
        self
    }

    #[must_use]
    pub fn build(self) -> EvaluationContext {
        self.context
    }
}
