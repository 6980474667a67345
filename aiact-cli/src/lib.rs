//! Library half of the `aiact` binary: argument definitions and the
//! subcommand implementations.

pub mod cli;
pub mod commands;

pub use cli::{AzureArgs, Cli, Command};
pub use commands::run;
