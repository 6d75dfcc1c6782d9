//! Foreground audio playback per role.

use tripscript_core::context::{ActionContext, AudioState, TripState};
use tripscript_core::instruction::Instruction;
use tripscript_schema::registry::Params;
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

use crate::modules::text;

pub(super) fn play_audio() -> ModuleDefinition {
    ModuleDefinition::new(
        "play_audio",
        "Start playing audio on a role's device from the beginning.",
        vec![
            ("role_name", PropertySpec::reference("roles").required()),
            ("audio", PropertySpec::media().required()),
        ],
        ModuleHooks::Action {
            apply: Some(apply_play_audio),
        },
    )
}

pub(super) fn pause_audio() -> ModuleDefinition {
    ModuleDefinition::new(
        "pause_audio",
        "Pause a role's audio.",
        vec![("role_name", PropertySpec::reference("roles").required())],
        ModuleHooks::Action {
            apply: Some(apply_pause_audio),
        },
    )
}

pub(super) fn resume_audio() -> ModuleDefinition {
    ModuleDefinition::new(
        "resume_audio",
        "Resume a role's paused audio.",
        vec![("role_name", PropertySpec::reference("roles").required())],
        ModuleHooks::Action {
            apply: Some(apply_resume_audio),
        },
    )
}

fn with_audio(context: &ActionContext<'_>, role_name: &str, audio: AudioState) -> Vec<Instruction> {
    let mut state: TripState = context.evaluation.trip_state.clone();
    state.audio_state_by_role.insert(role_name.to_owned(), audio);
    vec![
        Instruction::UpdateTripState { state },
        Instruction::UpdateAudio {
            role_name: role_name.to_owned(),
        },
    ]
}

fn apply_play_audio(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let role_name = text(params, "role_name");
    let audio = AudioState {
        audio: context.template(text(params, "audio")),
        is_playing: true,
        started_at: context.evaluate_at,
        started_elapsed_ms: 0,
        paused_at: None,
    };
    with_audio(context, role_name, audio)
}

fn apply_pause_audio(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let role_name = text(params, "role_name");
    let Some(current) = context.evaluation.trip_state.audio_state_by_role.get(role_name) else {
        return vec![Instruction::error(format!("No audio to pause for role \"{role_name}\"."))];
    };
    if !current.is_playing {
        return vec![Instruction::warn(format!("Audio for role \"{role_name}\" is already paused."))];
    }
    let played_ms = (context.evaluate_at - current.started_at).num_milliseconds();
    let audio = AudioState {
        is_playing: false,
        started_elapsed_ms: current.started_elapsed_ms + played_ms,
        paused_at: Some(context.evaluate_at),
        ..current.clone()
    };
    with_audio(context, role_name, audio)
}

fn apply_resume_audio(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let role_name = text(params, "role_name");
    let Some(current) = context.evaluation.trip_state.audio_state_by_role.get(role_name) else {
        return vec![Instruction::error(format!("No audio to resume for role \"{role_name}\"."))];
    };
    if current.is_playing {
        return vec![Instruction::warn(format!("Audio for role \"{role_name}\" is already playing."))];
    }
    let audio = AudioState {
        is_playing: true,
        started_at: context.evaluate_at,
        paused_at: None,
        ..current.clone()
    };
    with_audio(context, role_name, audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::actions::test_context::{at, params, script};
    use chrono::TimeDelta;
    use serde_json::json;
    use tripscript_core::context::EvaluationContext;
    use tripscript_core::instruction::LogLevel;

    fn playing(is_playing: bool) -> EvaluationContext {
        let mut evaluation = EvaluationContext::default();
        evaluation.trip_state.audio_state_by_role.insert(
            "Detective".to_owned(),
            AudioState {
                audio: "https://cdn.test/theme.mp3".to_owned(),
                is_playing,
                started_at: at() - TimeDelta::seconds(30),
                started_elapsed_ms: 5_000,
                paused_at: None,
            },
        );
        evaluation
    }

    fn audio_of(instructions: &[Instruction]) -> AudioState {
        match &instructions[0] {
            Instruction::UpdateTripState { state } => state.audio_state_by_role["Detective"].clone(),
            other => panic!("expected UpdateTripState, got {other:?}"),
        }
    }

    #[test]
    fn test_play_audio_starts_from_zero() {
        let (script, evaluation) = (script(), EvaluationContext::default());
        let context = ActionContext::new(&script, &evaluation, at());

        let result = apply_play_audio(
            &params(json!({"role_name": "Detective", "audio": "https://cdn.test/theme.mp3"})),
            &context,
        );

        let audio = audio_of(&result);
        assert!(audio.is_playing);
        assert_eq!(audio.started_at, at());
        assert_eq!(audio.started_elapsed_ms, 0);
        assert_eq!(
            result[1],
            Instruction::UpdateAudio {
                role_name: "Detective".to_owned()
            }
        );
    }

    #[test]
    fn test_pause_audio_accumulates_elapsed_time() {
        let (script, evaluation) = (script(), playing(true));
        let context = ActionContext::new(&script, &evaluation, at());

        let audio = audio_of(&apply_pause_audio(&params(json!({"role_name": "Detective"})), &context));

        assert!(!audio.is_playing);
        assert_eq!(audio.started_elapsed_ms, 35_000);
        assert_eq!(audio.paused_at, Some(at()));
    }

    #[test]
    fn test_resume_audio_restarts_clock() {
        let (script, evaluation) = (script(), playing(false));
        let context = ActionContext::new(&script, &evaluation, at());

        let audio = audio_of(&apply_resume_audio(&params(json!({"role_name": "Detective"})), &context));

        assert!(audio.is_playing);
        assert_eq!(audio.started_at, at());
        assert_eq!(audio.started_elapsed_ms, 5_000);
    }

    #[test]
    fn test_resume_audio_degrades_to_logs() {
        let script = script();
        let none = EvaluationContext::default();
        let already = playing(true);

        let missing = apply_resume_audio(
            &params(json!({"role_name": "Detective"})),
            &ActionContext::new(&script, &none, at()),
        );
        let redundant = apply_resume_audio(
            &params(json!({"role_name": "Detective"})),
            &ActionContext::new(&script, &already, at()),
        );

        assert_eq!(missing, vec![Instruction::error("No audio to resume for role \"Detective\".")]);
        match &redundant[..] {
            [Instruction::Log { level: LogLevel::Warn, .. }] => {}
            other => panic!("expected a single warning, got {other:?}"),
        }
    }
}
