//! Typed views over trigger content.

pub mod action_node;
pub mod trigger;

pub use action_node::{ActionCall, ActionNode, Branch};
pub use trigger::Trigger;
