//! CLI module for FinFlex
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP API
//! - init: Write a default configuration file
//! - check: Validate configuration and show the level schedule

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, init, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
