//! CLI support for the `glint` binary.

pub mod args;
pub mod commands;
pub mod context;
pub mod fixture;
pub mod logging;
pub mod output;

pub use context::CommandContext;
