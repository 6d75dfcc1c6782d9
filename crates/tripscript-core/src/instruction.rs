//! Instructions: declarative directives produced by evaluation.
//!
//! The engine only produces instructions; an external executor realizes
//! them against persistence, gateways and the scheduler.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::TripState;
use crate::event::Event;

/// Severity of a log instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Something unexpected that did not prevent the action.
    Warn,
    /// The action could not complete.
    Error,
}

/// An atomic directive for the external executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Instruction {
    /// Replace the trip's runtime state (scene, pages, audio).
    UpdateTripState {
        /// The complete new trip state.
        state: TripState,
    },
    /// Merge values into one player's state.
    UpdatePlayerState {
        /// Role whose player is updated.
        role_name: String,
        /// Values to merge.
        values: Map<String, Value>,
    },
    /// Merge top-level fields into the trip record.
    UpdateTripFields {
        /// Fields to merge.
        fields: Map<String, Value>,
    },
    /// Merge top-level fields into one player record.
    UpdatePlayerFields {
        /// Role whose player is updated.
        role_name: String,
        /// Fields to merge.
        fields: Map<String, Value>,
    },
    /// Merge values into the trip's value map.
    UpdateTripValues {
        /// Values to merge.
        values: Map<String, Value>,
    },
    /// Record when triggers fired.
    UpdateTripHistory {
        /// Trigger name to firing time.
        history: BTreeMap<String, DateTime<Utc>>,
    },
    /// Ask a role's interface to refresh.
    UpdateUi {
        /// Role whose interface should refresh.
        role_name: String,
    },
    /// Ask a role's device to resync audio playback.
    UpdateAudio {
        /// Role whose audio changed.
        role_name: String,
    },
    /// Place a phone call.
    InitiateCall {
        /// Role being called.
        to_role_name: String,
        /// Role the call appears to come from.
        as_role_name: String,
        /// Whether to detect voicemail before connecting.
        detect_voicemail: bool,
    },
    /// Record and deliver a message.
    CreateMessage {
        /// Sending role.
        from_role_name: String,
        /// Receiving role.
        to_role_name: String,
        /// Delivery medium, e.g. `text`.
        medium: String,
        /// Templated message body.
        content: String,
    },
    /// Feed a derived event into a later evaluation pass.
    EmitEvent {
        /// The event to evaluate.
        event: Event,
    },
    /// Resume the remaining work at a later time.
    WaitUntil {
        /// When to resume.
        until: DateTime<Utc>,
    },
    /// Record a message for operators.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
}

impl Instruction {
    /// Creates a log instruction.
    #[must_use]
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Creates an error-level log instruction.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Creates a warn-level log instruction.
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Returns true for instructions that mutate trip or player state.
    #[must_use]
    pub fn mutates_state(&self) -> bool {
        matches!(
            self,
            Self::UpdateTripState { .. }
                | Self::UpdatePlayerState { .. }
                | Self::UpdateTripFields { .. }
                | Self::UpdatePlayerFields { .. }
                | Self::UpdateTripValues { .. }
                | Self::UpdateTripHistory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instruction_serializes_with_operation_tag() {
        let instruction = Instruction::error("Could not find scene named \"finale\".");

        assert_eq!(
            serde_json::to_value(&instruction).unwrap(),
            json!({
                "operation": "log",
                "level": "error",
                "message": "Could not find scene named \"finale\"."
            })
        );
    }

    #[test]
    fn test_emit_event_round_trips_through_json() {
        let instruction = Instruction::EmitEvent {
            event: Event::new("cue_signaled").with("cue", "bell"),
        };

        let encoded = serde_json::to_value(&instruction).unwrap();
        assert_eq!(
            encoded,
            json!({"operation": "emit_event", "event": {"type": "cue_signaled", "cue": "bell"}})
        );
        let decoded: Instruction = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, instruction);
    }

    #[test]
    fn test_log_does_not_mutate_state() {
        assert!(!Instruction::warn("careful").mutates_state());
        assert!(
            Instruction::UpdateTripValues {
                values: Map::new()
            }
            .mutates_state()
        );
    }
}
