//! Running migrations over documents and fixtures.

pub mod fixtures;
pub mod pipeline;
