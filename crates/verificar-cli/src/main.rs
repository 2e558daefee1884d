//! Verificador CLI: batch coverage verification over Maven projects
//!
//! ## Usage
//!
//! ```bash
//! verificador run --projects-root repos --commits-dir validcommits
//! verificador run --project gson --java-home 11=/opt/jdk-11
//! verificador status --progress-dir progress
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use verificador::{
    execute_run, execute_status, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Run(args) => execute_run(&config, &args),
        Commands::Status(args) => execute_status(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_normal() {
        let cli = Cli::parse_from(["verificador", "status"]);
        let config = build_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert_eq!(config.color, ColorChoice::Auto);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let cli = Cli::parse_from(["verificador", "status", "-q", "-v"]);
        let config = build_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_verbose_levels() {
        let once = Cli::parse_from(["verificador", "status", "-v"]);
        assert_eq!(build_config(&once).verbosity, Verbosity::Verbose);
        let twice = Cli::parse_from(["verificador", "status", "-vv"]);
        assert_eq!(build_config(&twice).verbosity, Verbosity::Debug);
    }

    #[test]
    fn test_color_flag_carried() {
        let cli = Cli::parse_from(["verificador", "status", "--color", "never"]);
        let config = build_config(&cli);
        assert_eq!(config.color, ColorChoice::Never);
    }
}
