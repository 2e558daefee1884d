//! Batch run handler

use std::path::PathBuf;

use verificar::{
    discover_projects, BatchDriver, BatchSummary, GitMavenExecutor, ProgressTracker, ProjectSpec,
    ResultAccumulator, ToolchainSet, Workspace,
};

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let discovered = discover_projects(&args.projects_root, &args.commits_dir)?;
    let projects = filter_projects(discovered, &args.projects)?;
    if projects.is_empty() {
        reporter.info("No projects to process");
        return Ok(());
    }

    let toolchains = build_toolchains(&args.java_homes);
    let driver = BatchDriver::new(
        ProgressTracker::new(&args.progress_dir),
        ResultAccumulator::new(&args.output_dir),
    );

    reporter.header(&format!("Verifying {} project(s)", projects.len()));
    reporter.start_progress(projects.len() as u64, "starting");

    let mut batch = BatchSummary::default();
    for project in &projects {
        reporter.set_message(&project.name);
        let summary = driver.run(std::slice::from_ref(project), |spec| {
            GitMavenExecutor::new(
                Workspace::new(spec.project_dir.clone()),
                toolchains.clone(),
            )
        });
        merge_summary(&mut batch, summary);
        reporter.increment(1);
    }
    reporter.finish();

    report_outcomes(&reporter, &batch);
    Ok(())
}

/// Keep only the requested projects, rejecting names that were not discovered.
fn filter_projects(
    discovered: Vec<ProjectSpec>,
    wanted: &[String],
) -> CliResult<Vec<ProjectSpec>> {
    if wanted.is_empty() {
        return Ok(discovered);
    }
    for name in wanted {
        if !discovered.iter().any(|p| &p.name == name) {
            let known: Vec<&str> = discovered.iter().map(|p| p.name.as_str()).collect();
            return Err(CliError::invalid_argument(format!(
                "unknown project '{name}'; discovered: {}",
                known.join(", ")
            )));
        }
    }
    Ok(discovered
        .into_iter()
        .filter(|p| wanted.contains(&p.name))
        .collect())
}

/// Default JDK table with CLI overrides applied on top.
fn build_toolchains(overrides: &[(u32, PathBuf)]) -> ToolchainSet {
    let mut set = ToolchainSet::default();
    for (version, home) in overrides {
        set.insert(*version, home.clone());
    }
    set
}

fn merge_summary(into: &mut BatchSummary, from: BatchSummary) {
    into.unreadable_projects += from.unreadable_projects;
    into.projects.extend(from.projects);
}

fn report_outcomes(reporter: &ProgressReporter, batch: &BatchSummary) {
    for outcome in &batch.projects {
        let line = format!(
            "{}: {}/{} commits verified ({} skipped)",
            outcome.project, outcome.succeeded, outcome.total, outcome.skipped
        );
        if outcome.succeeded > 0 {
            reporter.success(&line);
        } else {
            reporter.info(&line);
        }
    }
    if batch.unreadable_projects > 0 {
        reporter.warning(&format!(
            "{} project(s) skipped: unreadable work items",
            batch.unreadable_projects
        ));
    }
    reporter.header(&format!(
        "Processed {} commit(s), {} verified",
        batch.total_processed(),
        batch.total_succeeded()
    ));
}
