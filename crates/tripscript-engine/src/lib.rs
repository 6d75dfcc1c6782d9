//! Tripscript Engine — runs triggers against runtime events.
//!
//! Holds the module catalog (resource types, actions, events, conditions and
//! panels), the process-wide registry built from it, and the application
//! services that use the registry: the action dispatcher, the event matcher,
//! the trigger evaluator with conditional collapse, whole-script validation
//! and the cascading kernel.

pub mod application;
pub mod domain;
pub mod modules;
pub mod registry;

pub use application::conditions::ConditionEvaluator;
pub use application::dispatcher::ActionDispatcher;
pub use application::evaluator::{Step, TriggerEvaluator, TriggerOutcome};
pub use application::kernel::{Kernel, KernelResult, ScheduledAction};
pub use application::matcher::EventMatcher;
pub use application::validation::{parent_claims, validate_script};
pub use domain::{ActionCall, ActionNode, Branch, Trigger};
pub use registry::registry;
