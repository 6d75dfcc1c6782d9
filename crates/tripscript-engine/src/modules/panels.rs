//! Page panels. Panels carry no behaviour here beyond titles and checks.

use pulldown_cmark::{Event as MarkdownEvent, Parser, TagEnd};
use serde_json::Value;
use tripscript_core::script::{ScriptContent, str_field};
use tripscript_schema::registry::Params;
use tripscript_schema::{ModuleDefinition, ModuleHooks, PropertySpec};

const TITLE_LENGTH: usize = 30;

#[must_use]
pub fn definitions() -> Vec<ModuleDefinition> {
    vec![
        panel(
            "text",
            "A block of markdown text.",
            vec![
                ("text", PropertySpec::markdown().required()),
                ("style", PropertySpec::one_of(&["centered", "banner"])),
            ],
        )
        .with_title(text_title),
        panel(
            "button",
            "A button.",
            vec![
                ("text", PropertySpec::string().required().with_help("Visible label on the button.")),
                ("style", PropertySpec::one_of(&["solo"])),
            ],
        )
        .with_title(button_title),
        panel(
            "image",
            "An image.",
            vec![
                ("image", PropertySpec::media()),
                ("style", PropertySpec::one_of(&["float-right"])),
            ],
        ),
        panel(
            "audio_foreground",
            "An audio clip that can be played at will.",
            vec![("audio", PropertySpec::media())],
        ),
        panel("video", "A video.", vec![("video", PropertySpec::media())]),
        panel(
            "yesno",
            "A yes/no choice saved to a value.",
            vec![
                ("text", PropertySpec::string().required()),
                ("value_ref", PropertySpec::simple_attribute().required()),
            ],
        ),
        panel(
            "choice",
            "A multiple choice option saved to a value.",
            vec![
                ("text", PropertySpec::string().required()),
                ("value_ref", PropertySpec::simple_attribute().required()),
                (
                    "choices",
                    PropertySpec::list(PropertySpec::object(vec![
                        ("value", PropertySpec::string().required()),
                        ("text", PropertySpec::string().required()),
                    ]))
                    .required(),
                ),
            ],
        ),
        panel(
            "numberpad",
            "A number input.",
            vec![
                ("submit", PropertySpec::string().with_default("Submit")),
                ("placeholder", PropertySpec::string()),
            ],
        )
        .with_title(numberpad_title),
        panel(
            "directions",
            "Live directions along a route or to a waypoint.",
            vec![
                ("route", PropertySpec::reference("routes")),
                ("waypoint", PropertySpec::reference("waypoints")),
                ("geofence", PropertySpec::reference("geofences")),
                ("destination_name", PropertySpec::string()),
            ],
        )
        .with_title(directions_title)
        .with_validate(validate_directions),
    ]
}

fn panel(name: &'static str, help: &'static str, properties: Vec<(&'static str, PropertySpec)>) -> ModuleDefinition {
    ModuleDefinition::new(name, help, properties, ModuleHooks::Panel)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= TITLE_LENGTH {
        return text.to_owned();
    }
    let head: String = text.chars().take(TITLE_LENGTH - 2).collect();
    format!("{head}..")
}

/// First line of the rendered markdown, as plain text.
fn first_line(markdown: &str) -> String {
    let mut line = String::new();
    for event in Parser::new(markdown) {
        match event {
            MarkdownEvent::Text(text) | MarkdownEvent::Code(text) => line.push_str(&text),
            MarkdownEvent::SoftBreak
            | MarkdownEvent::HardBreak
            | MarkdownEvent::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item)
                if !line.is_empty() =>
            {
                break;
            }
            _ => {}
        }
    }
    line.trim().to_owned()
}

fn text_title(panel: &Params, _: &ScriptContent) -> String {
    truncate(&first_line(str_field(panel, "text").unwrap_or_default()))
}

fn button_title(panel: &Params, _: &ScriptContent) -> String {
    truncate(str_field(panel, "text").unwrap_or_default())
}

fn numberpad_title(panel: &Params, _: &ScriptContent) -> String {
    truncate(str_field(panel, "placeholder").unwrap_or("<no placeholder>"))
}

fn directions_title(panel: &Params, script: &ScriptContent) -> String {
    let titled = |collection: &str, key: &str| {
        str_field(panel, key).map(|name| {
            script
                .find(collection, name)
                .and_then(|resource| str_field(resource, "title"))
                .unwrap_or(name)
                .to_owned()
        })
    };
    if let Some(route) = titled("routes", "route") {
        return format!("directions along \"{route}\"");
    }
    if let Some(waypoint) = titled("waypoints", "waypoint") {
        return format!("directions at \"{waypoint}\"");
    }
    format!(
        "directions to {}",
        str_field(panel, "destination_name").unwrap_or("unknown")
    )
}

fn validate_directions(panel: &Params, _: &ScriptContent) -> Vec<String> {
    let present = |key: &str| panel.get(key).is_some_and(|value| !value.is_null() && value != &Value::from(""));
    if present("route") || present("waypoint") {
        return Vec::new();
    }
    vec!["Directions panel requires either a route or a waypoint.".to_owned()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_title_is_first_rendered_line() {
        let script = ScriptContent::default();

        let title = text_title(
            &params(json!({"text": "## Welcome *back*\n\nThe manor awaits."})),
            &script,
        );

        assert_eq!(title, "Welcome back");
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let script = ScriptContent::default();

        let title = button_title(
            &params(json!({"text": "Press here when you have found the hidden key"})),
            &script,
        );

        assert_eq!(title, "Press here when you have fou..");
        assert_eq!(title.chars().count(), TITLE_LENGTH);
    }

    #[test]
    fn test_numberpad_title_falls_back_to_marker() {
        assert_eq!(
            numberpad_title(&params(json!({})), &ScriptContent::default()),
            "<no placeholder>"
        );
    }

    #[test]
    fn test_directions_title_uses_route_title() {
        let script = ScriptContent::from_value(json!({
            "routes": [{"name": "walk", "title": "Garden walk", "from": "a", "to": "b"}]
        }))
        .unwrap();

        assert_eq!(
            directions_title(&params(json!({"route": "walk"})), &script),
            "directions along \"Garden walk\""
        );
        assert_eq!(
            directions_title(&params(json!({"destination_name": "the pier"})), &script),
            "directions to the pier"
        );
    }

    #[test]
    fn test_directions_requires_route_or_waypoint() {
        let script = ScriptContent::default();

        assert_eq!(
            validate_directions(&params(json!({"destination_name": "the pier"})), &script),
            vec!["Directions panel requires either a route or a waypoint.".to_owned()]
        );
        assert!(validate_directions(&params(json!({"waypoint": "pier"})), &script).is_empty());
    }
}
