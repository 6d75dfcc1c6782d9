//! Messages, calls and cues.

use serde_json::Value;
use tripscript_core::context::ActionContext;
use tripscript_core::event::Event;
use tripscript_core::instruction::Instruction;
use tripscript_schema::registry::{ApplyHook, Params};
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

use crate::modules::text;

pub(super) fn send_text() -> ModuleDefinition {
    ModuleDefinition::new(
        "send_text",
        "Send a text message from one role to another.",
        vec![
            ("from_role_name", PropertySpec::reference("roles").required()),
            ("to_role_name", PropertySpec::reference("roles").required()),
            ("content", PropertySpec::string().required().with_help("Message text; may use {{templates}}.")),
        ],
        ModuleHooks::Action {
            apply: Some(apply_send_text),
        },
    )
}

pub(super) fn send_audio() -> ModuleDefinition {
    media_message("send_audio", "Send an audio message from one role to another.", "audio", apply_send_audio)
}

pub(super) fn send_image() -> ModuleDefinition {
    media_message("send_image", "Send an image from one role to another.", "image", apply_send_image)
}

fn media_message(name: &'static str, help: &'static str, field: &'static str, apply: ApplyHook) -> ModuleDefinition {
    ModuleDefinition::new(
        name,
        help,
        vec![
            ("from_role_name", PropertySpec::reference("roles").required()),
            ("to_role_name", PropertySpec::reference("roles").required()),
            (field, PropertySpec::media().required()),
        ],
        ModuleHooks::Action { apply: Some(apply) },
    )
}

pub(super) fn initiate_call() -> ModuleDefinition {
    ModuleDefinition::new(
        "initiate_call",
        "Call a role's phone.",
        vec![
            ("to_role_name", PropertySpec::reference("roles").required()),
            ("as_role_name", PropertySpec::reference("roles").required()),
            ("detect_voicemail", PropertySpec::boolean().with_default(false)),
        ],
        ModuleHooks::Action {
            apply: Some(apply_initiate_call),
        },
    )
}

pub(super) fn signal_cue() -> ModuleDefinition {
    ModuleDefinition::new(
        "signal_cue",
        "Signal a cue for triggers to respond to.",
        vec![("cue_name", PropertySpec::reference("cues").required())],
        ModuleHooks::Action {
            apply: Some(apply_signal_cue),
        },
    )
}

fn apply_send_text(params: &Params, context: &ActionContext<'_>) -> Vec<Instruction> {
    let from = text(params, "from_role_name");
    let to = text(params, "to_role_name");
    let content = context.template(text(params, "content"));
    vec![
        Instruction::CreateMessage {
            from_role_name: from.to_owned(),
            to_role_name: to.to_owned(),
            medium: "text".to_owned(),
            content: content.clone(),
        },
        Instruction::EmitEvent {
            event: Event::new("text_received")
                .with("from", from)
                .with("to", to)
                .with("content", content),
        },
    ]
}

fn media_instruction(params: &Params, medium: &str) -> Instruction {
    Instruction::CreateMessage {
        from_role_name: text(params, "from_role_name").to_owned(),
        to_role_name: text(params, "to_role_name").to_owned(),
        medium: medium.to_owned(),
        content: text(params, medium).to_owned(),
    }
}

fn apply_send_audio(params: &Params, _: &ActionContext<'_>) -> Vec<Instruction> {
    vec![media_instruction(params, "audio")]
}

fn apply_send_image(params: &Params, _: &ActionContext<'_>) -> Vec<Instruction> {
    vec![media_instruction(params, "image")]
}

fn apply_initiate_call(params: &Params, _: &ActionContext<'_>) -> Vec<Instruction> {
    vec![Instruction::InitiateCall {
        to_role_name: text(params, "to_role_name").to_owned(),
        as_role_name: text(params, "as_role_name").to_owned(),
        detect_voicemail: params
            .get("detect_voicemail")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }]
}

fn apply_signal_cue(params: &Params, _: &ActionContext<'_>) -> Vec<Instruction> {
    vec![Instruction::EmitEvent {
        event: Event::new("cue_signaled").with("cue", text(params, "cue_name")),
    }]
}
