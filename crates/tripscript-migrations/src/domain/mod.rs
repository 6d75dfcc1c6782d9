//! Migration definitions and the state threaded through them.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

pub mod walk;

/// Rewrites the whole document. Runs before any scoped transform.
pub type DocumentTransform = fn(&mut Map<String, Value>, &mut MigrationState);

/// Rewrites one element reached by a [`Scope`].
pub type ElementTransform = fn(&mut Value, &mut MigrationState) -> TransformOutcome;

/// What a scoped transform wants done with its element.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    /// Keep the element, including any in-place edits.
    Keep,
    /// Substitute a new value.
    Replace(Value),
    /// Substitute several elements. Only meaningful inside lists.
    Split(Vec<Value>),
    /// Drop the element.
    Remove,
}

/// Where a scoped transform applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Each element of a top-level collection.
    Collection(&'static str),
    /// Every action node of every trigger, through conditional branches.
    Actions,
    /// Every trigger `if`/`active_if`, scene `active_if`, panel
    /// `visible_if`, and conditional or elseif `if`.
    IfClauses,
    /// Every panel of every page.
    Panels,
}

/// Asset paths mapped to the urls they are hosted at.
pub type MediaLibrary = BTreeMap<String, String>;

/// A before/after pair pinning one migration's behaviour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixture {
    pub before: Value,
    pub after: Value,
    /// Media the migration may resolve paths against.
    pub media: MediaLibrary,
}

impl Fixture {
    #[must_use]
    pub fn new(before: Value, after: Value) -> Self {
        Self {
            before,
            after,
            media: MediaLibrary::new(),
        }
    }

    #[must_use]
    pub fn with_media(mut self, assets: &[(&str, &str)]) -> Self {
        self.media
            .extend(assets.iter().map(|(path, url)| ((*path).to_owned(), (*url).to_owned())));
        self
    }
}

/// One step of the pipeline.
#[derive(Debug, Clone)]
pub struct MigrationDefinition {
    /// Version the document has once this step ran.
    pub version: u32,
    pub name: &'static str,
    pub document: Option<DocumentTransform>,
    /// Applied in order after the document transform.
    pub transforms: Vec<(Scope, ElementTransform)>,
    pub fixtures: Vec<Fixture>,
}

/// Per-document working state. Created fresh for every document and every
/// fixture, never shared between calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationState {
    /// Monotonic counter for generated ids.
    pub counter: u32,
    /// Names seen so far, per collection.
    pub seen: BTreeMap<String, BTreeSet<String>>,
    /// Collections removed from the document but still needed.
    pub stash: Map<String, Value>,
    /// Hosted urls for legacy media paths.
    pub media: MediaLibrary,
}

impl MigrationState {
    #[must_use]
    pub fn with_media(media: MediaLibrary) -> Self {
        Self {
            media,
            ..Self::default()
        }
    }

    /// Bumps the counter by `step` and returns the new value.
    pub fn advance(&mut self, step: u32) -> u32 {
        self.counter += step;
        self.counter
    }

    /// Records `name` in `collection`, returning false if it was already
    /// there.
    pub fn claim_name(&mut self, collection: &str, name: &str) -> bool {
        self.seen
            .entry(collection.to_owned())
            .or_default()
            .insert(name.to_owned())
    }
}
