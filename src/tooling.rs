//! Tooling & Integration Layer
//!
//! Command-line interface over the registry library. Every command is a thin
//! wrapper around a registry call, rendering results as text or JSON.

pub mod cli;

pub use cli::{Cli, CliContext, CommandOutput, Commands};
