//! Tripscript Core — shared vocabulary for the content rule engine.
//!
//! This crate defines the types every other crate speaks: script content,
//! runtime events, evaluation context, instructions and errors. It contains
//! no evaluation logic and performs no I/O.

pub mod clock;
pub mod condition;
pub mod context;
pub mod error;
pub mod event;
pub mod instruction;
pub mod lookup;
pub mod script;
pub mod time;
