//! Shared test fixtures and utilities for the Tripscript engine.

mod clock;
mod context;
mod script;

pub use clock::{FixedClock, fixed_time};
pub use context::ContextBuilder;
pub use script::{ScriptBuilder, sample_script};
