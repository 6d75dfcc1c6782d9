//! Moves legacy media paths into typed url fields.
//!
//! Urls and `{{templates}}` are kept as written. Any other path is looked up
//! in the media library; a path with no hosted url is dropped with a warning.

use serde_json::{Map, Value, json};

use crate::domain::{Fixture, MigrationDefinition, MigrationState, Scope, TransformOutcome};

const EMPTY_CLIP_TRANSCRIPT: &str = "This clip is empty.";

pub(super) fn definition() -> MigrationDefinition {
    MigrationDefinition {
        version: 10,
        name: "media_urls",
        document: None,
        transforms: vec![
            (Scope::Actions, action_media),
            (Scope::Panels, panel_media),
            (Scope::Collection("clips"), clip_media),
        ],
        fixtures: vec![
            Fixture::new(
                json!({
                    "triggers": [{"actions": [
                        {"name": "play_audio", "path": "a.mp3"},
                        {"name": "send_audio", "content": "a.mp3"},
                        {"name": "send_image", "content": "c.jpg"}
                    ]}],
                    "pages": [{"panels": [
                        {"type": "image", "path": "c.jpg"},
                        {"type": "audio_foreground", "path": "d.m4a"},
                        {"type": "video", "path": "c.jpg"}
                    ]}],
                    "clips": [{"path": "d.m4a"}, {"transcript": "hi"}, {"path": "invalid"}]
                }),
                json!({
                    "triggers": [{"actions": [
                        {"name": "play_audio", "audio": "http://server/a.mp3"},
                        {"name": "send_audio", "audio": "http://server/a.mp3"},
                        {"name": "send_image", "image": "https://host/c.jpg"}
                    ]}],
                    "pages": [{"panels": [
                        {"type": "image", "image": "https://host/c.jpg"},
                        {"type": "audio_foreground", "audio": "http://host/path/d.m4a"},
                        {"type": "video", "video": "https://host/c.jpg"}
                    ]}],
                    "clips": [{"audio": "http://host/path/d.m4a"}, {"transcript": "hi"}, {"transcript": EMPTY_CLIP_TRANSCRIPT}]
                }),
            )
            .with_media(&[
                ("a.mp3", "http://server/a.mp3"),
                ("c.jpg", "https://host/c.jpg"),
                ("d.m4a", "http://host/path/d.m4a"),
            ]),
        ],
    }
}

/// Legacy field and its replacement for each media-bearing action.
fn action_fields(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "play_audio" => Some(("path", "audio")),
        "send_audio" => Some(("content", "audio")),
        "send_image" => Some(("content", "image")),
        _ => None,
    }
}

fn panel_fields(kind: &str) -> Option<(&'static str, &'static str)> {
    match kind {
        "audio_foreground" => Some(("path", "audio")),
        "image" => Some(("path", "image")),
        "video" => Some(("path", "video")),
        _ => None,
    }
}

fn hosted_url(path: &str, state: &MigrationState) -> Option<String> {
    let is_url = path.starts_with("https://") || path.starts_with("http://") || path.starts_with("{{");
    if is_url {
        return Some(path.to_owned());
    }
    let url = state.media.get(path).cloned();
    if url.is_none() {
        tracing::warn!(path, "no hosted media for path; dropped");
    }
    url
}

/// Moves `from` to `to`, resolved to a url. `None` when there was no path,
/// otherwise whether it resolved.
fn move_media(object: &mut Map<String, Value>, from: &str, to: &str, state: &MigrationState) -> Option<bool> {
    let path = match object.remove(from) {
        Some(Value::String(path)) if !path.is_empty() => path,
        _ => return None,
    };
    let url = hosted_url(&path, state);
    let resolved = url.is_some();
    if let Some(url) = url {
        object.insert(to.to_owned(), Value::from(url));
    }
    Some(resolved)
}

fn action_media(action: &mut Value, state: &mut MigrationState) -> TransformOutcome {
    let Some(object) = action.as_object_mut() else {
        return TransformOutcome::Keep;
    };
    let fields = object.get("name").and_then(Value::as_str).and_then(action_fields);
    if let Some((from, to)) = fields {
        move_media(object, from, to, state);
    }
    TransformOutcome::Keep
}

fn panel_media(panel: &mut Value, state: &mut MigrationState) -> TransformOutcome {
    let Some(object) = panel.as_object_mut() else {
        return TransformOutcome::Keep;
    };
    let fields = object.get("type").and_then(Value::as_str).and_then(panel_fields);
    if let Some((from, to)) = fields {
        move_media(object, from, to, state);
    }
    TransformOutcome::Keep
}

fn clip_media(clip: &mut Value, state: &mut MigrationState) -> TransformOutcome {
    let Some(object) = clip.as_object_mut() else {
        return TransformOutcome::Keep;
    };
    let unresolved = move_media(object, "path", "audio", state) == Some(false);
    if unresolved && !object.contains_key("transcript") {
        object.insert("transcript".to_owned(), Value::from(EMPTY_CLIP_TRANSCRIPT));
    }
    TransformOutcome::Keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_and_templates_need_no_library() {
        let state = MigrationState::default();

        assert_eq!(hosted_url("https://cdn/a.mp3", &state).as_deref(), Some("https://cdn/a.mp3"));
        assert_eq!(hosted_url("{{player.photo}}", &state).as_deref(), Some("{{player.photo}}"));
        assert_eq!(hosted_url("a.mp3", &state), None);
    }

    #[test]
    fn test_unresolved_action_path_is_dropped() {
        let mut action = json!({"name": "play_audio", "role_name": "Detective", "path": "gone.mp3"});

        action_media(&mut action, &mut MigrationState::default());

        assert_eq!(action, json!({"name": "play_audio", "role_name": "Detective"}));
    }

    #[test]
    fn test_clip_with_transcript_keeps_it_when_path_is_unresolved() {
        let mut clip = json!({"name": "c", "path": "gone.mp3", "transcript": "Hello there."});

        clip_media(&mut clip, &mut MigrationState::default());

        assert_eq!(clip, json!({"name": "c", "transcript": "Hello there."}));
    }

    #[test]
    fn test_other_panels_pass_through() {
        let mut panel = json!({"type": "text", "text": "hi", "path": "x"});
        panel_media(&mut panel, &mut MigrationState::default());
        assert_eq!(panel["path"], "x");
    }
}
