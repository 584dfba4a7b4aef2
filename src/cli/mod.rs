//! CLI module for the converge tool.
//!
//! This module provides the command-line interface the hosting engine
//! invokes, one resource per process.

mod commands;
mod output;

pub use commands::{Cli, Commands, InstanceArgs, LogFormat, OutputFormat};
pub use output::OutputFormatter;
