//! Services that run content against the registry.

pub mod conditions;
pub mod dispatcher;
pub mod evaluator;
pub mod kernel;
pub mod matcher;
pub mod validation;
