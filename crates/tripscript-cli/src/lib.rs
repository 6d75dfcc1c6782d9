//! Tripscript CLI — loads content from disk and drives the engine.
//!
//! The binary is a thin shell over this library: argument parsing,
//! environment configuration, document loading and the command handlers
//! all live here so they can be tested without a process boundary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod load;
pub mod telemetry;

pub use cli::{Cli, Command};
pub use config::{Config, LogFormat};
pub use error::AppError;
