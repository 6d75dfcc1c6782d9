//! Command handlers. Each returns the JSON document the binary prints.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tracing::instrument;
use tripscript_core::context::EvaluationContext;
use tripscript_core::error::{EngineError, FieldError};
use tripscript_core::event::Event;
use tripscript_core::script::ScriptContent;
use tripscript_engine::{Kernel, KernelResult, registry, validate_script};
use tripscript_migrations::MediaLibrary;
use tripscript_schema::{Category, ModuleDefinition, PropertySpec};

use crate::cli::Command;
use crate::config::Config;
use crate::error::AppError;
use crate::load;

/// Runs `command`, loading its inputs from disk.
///
/// # Errors
///
/// Returns whatever the command's loading, migration, validation or
/// configuration step fails with.
pub fn run(command: &Command, config: &Config) -> Result<Value, AppError> {
    match command {
        Command::Migrate { script, media } => {
            let media: MediaLibrary = match media {
                Some(path) => load::read(path)?,
                None => MediaLibrary::new(),
            };
            Ok(tripscript_migrations::migrate_with_media(load::read(script)?, &media)?)
        }
        Command::Validate { script } => {
            let script = load_script(load::read(script)?)?;
            let warnings = validate(&script)?;
            Ok(serde_json::to_value(warnings)?)
        }
        Command::Evaluate { script, event, context } => {
            let script = load_script(load::read(script)?)?;
            let event: Event = load::read(event)?;
            let mut context: EvaluationContext = match context {
                Some(path) => load::read(path)?,
                None => EvaluationContext::default(),
            };
            context.timezone = config.timezone;
            let evaluate_at = config.clock()?.now();
            let result = evaluate(&script, &event, &context, evaluate_at)?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Reference { category } => Ok(reference(category.map(Category::from))),
        Command::CheckFixtures => {
            tripscript_migrations::check_all_fixtures()?;
            let count = tripscript_migrations::migrations::all().len();
            Ok(json!({"migrations": count, "status": "ok"}))
        }
    }
}

/// Migrates a raw document to the latest version.
///
/// # Errors
///
/// Returns `EngineError::MalformedDocument` for non-object or too-new
/// documents.
pub fn migrate(document: Value) -> Result<Value, AppError> {
    Ok(tripscript_migrations::migrate(document)?)
}

/// Migrates a raw document and wraps it as script content.
///
/// # Errors
///
/// As [`migrate`].
pub fn load_script(document: Value) -> Result<ScriptContent, AppError> {
    let migrated = migrate(document)?;
    ScriptContent::from_value(migrated)
        .ok_or_else(|| EngineError::MalformedDocument("script content must be an object".to_owned()).into())
}

/// Validates a script, returning its warnings.
///
/// # Errors
///
/// Returns `EngineError::SchemaValidation` listing every error.
#[instrument(skip_all)]
pub fn validate(script: &ScriptContent) -> Result<Vec<FieldError>, AppError> {
    let warnings = validate_script(registry(), script)?;
    for warning in &warnings {
        tracing::warn!(path = %warning.path, "{}", warning.message);
    }
    Ok(warnings)
}

/// Validates a script, then runs `event` through it.
///
/// # Errors
///
/// Returns `EngineError::SchemaValidation` if the script is invalid; invalid
/// content never reaches the kernel.
#[instrument(skip_all, fields(event = %event.kind))]
pub fn evaluate(
    script: &ScriptContent,
    event: &Event,
    context: &EvaluationContext,
    evaluate_at: DateTime<Utc>,
) -> Result<KernelResult, AppError> {
    validate(script)?;
    let result = Kernel::new(registry(), script, evaluate_at).process_event(event, context);
    tracing::info!(
        instructions = result.instructions.len(),
        scheduled = result.scheduled_actions.len(),
        "evaluated event"
    );
    Ok(result)
}

fn describe_property(spec: &PropertySpec) -> Value {
    let mut described = Map::new();
    described.insert("type".to_owned(), Value::from(spec.label()));
    described.insert("required".to_owned(), Value::from(spec.required));
    if let Some(default) = &spec.default {
        described.insert("default".to_owned(), default.clone());
    }
    if let Some(help) = spec.help {
        described.insert("help".to_owned(), Value::from(help));
    }
    Value::Object(described)
}

fn describe_module(module: &ModuleDefinition) -> Value {
    let properties: Map<String, Value> = registry()
        .member_properties(module)
        .iter()
        .map(|(name, spec)| ((*name).to_owned(), describe_property(spec)))
        .collect();
    json!({"name": module.name, "help": module.help, "properties": properties})
}

/// Documents every module, or one category's modules.
#[must_use]
pub fn reference(category: Option<Category>) -> Value {
    let categories = match category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    let reference: Map<String, Value> = categories
        .into_iter()
        .map(|category| {
            let modules: Vec<Value> = registry().modules(category).map(describe_module).collect();
            (category.as_str().to_owned(), Value::Array(modules))
        })
        .collect();
    Value::Object(reference)
}
