//! Tripscript Schema — the type system and module registry.
//!
//! Property schemas describe every field of every resource, action, event,
//! condition and panel. The registry maps `(category, discriminant)` to the
//! module that defines a kind. Both are read-only once built.

pub mod property;
pub mod registry;
pub mod validate;

pub use property::{Properties, PropertyKind, PropertySpec};
pub use registry::{Category, ModuleDefinition, ModuleHooks, Registry};
pub use validate::{Findings, Validator};
