//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Verificador: CLI for Verificar - coverage-verified pair extraction over commit histories
#[derive(Parser, Debug)]
#[command(name = "verificador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the verification batch over discovered projects
    Run(RunArgs),

    /// Show persisted progress without executing anything
    Status(StatusArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding one cloned repository per project
    #[arg(long, default_value = "target_projects", value_name = "DIR")]
    pub projects_root: PathBuf,

    /// Directory holding <project>-valid.json work-item files
    #[arg(long, default_value = "validcommits", value_name = "DIR")]
    pub commits_dir: PathBuf,

    /// Directory for progress checkpoints
    #[arg(long, default_value = "progress", value_name = "DIR")]
    pub progress_dir: PathBuf,

    /// Directory for covered-pair result files
    #[arg(long, default_value = "covered_pairs", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Process only the named project (repeatable)
    #[arg(long = "project", value_name = "NAME")]
    pub projects: Vec<String>,

    /// Override or extend a JDK installation, as <version>=<path> (repeatable)
    #[arg(long = "java-home", value_name = "VER=PATH", value_parser = parse_java_home)]
    pub java_homes: Vec<(u32, PathBuf)>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Directory holding progress checkpoints
    #[arg(long, default_value = "progress", value_name = "DIR")]
    pub progress_dir: PathBuf,

    /// Show only the named project (repeatable)
    #[arg(long = "project", value_name = "NAME")]
    pub projects: Vec<String>,
}

/// Parse a `--java-home` override of the form `<version>=<path>`.
fn parse_java_home(value: &str) -> Result<(u32, PathBuf), String> {
    let (version, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <version>=<path>, got '{value}'"))?;
    let version: u32 = version
        .trim()
        .parse()
        .map_err(|_| format!("JDK version must be a number, got '{version}'"))?;
    if path.is_empty() {
        return Err(format!("empty path in '{value}'"));
    }
    Ok((version, PathBuf::from(path)))
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
