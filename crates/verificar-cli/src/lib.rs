//! Verificador CLI Library
//!
//! Command-line interface for the Verificar coverage-verification pipeline.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{Cli, ColorArg, Commands, RunArgs, StatusArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use handlers::{execute_run, execute_status};
pub use output::ProgressReporter;
