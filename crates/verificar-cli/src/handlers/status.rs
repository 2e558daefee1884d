//! Checkpoint status handler

use std::fs;
use std::path::Path;

use chrono::DateTime;
use tracing::warn;
use verificar::{ProgressRecord, RunStatus};

use crate::commands::StatusArgs;
use crate::config::CliConfig;
use crate::error::CliResult;

const RECORD_SUFFIX: &str = "_progress.json";

/// Execute the status command
pub fn execute_status(config: &CliConfig, args: &StatusArgs) -> CliResult<()> {
    let records = read_records(&args.progress_dir, &args.projects)?;
    if records.is_empty() {
        if !config.verbosity.is_quiet() {
            println!("No progress records found");
        }
        return Ok(());
    }

    for record in &records {
        println!("{}", render_record(record));
        if config.verbosity.is_verbose() {
            match record.end_time {
                Some(end) => println!(
                    "    started {}, finished {}",
                    format_epoch(record.start_time),
                    format_epoch(end)
                ),
                None => println!("    started {}", format_epoch(record.start_time)),
            }
        }
    }
    Ok(())
}

/// Load every progress record under `dir`, optionally restricted to the
/// named projects. A missing directory means nothing has run yet.
fn read_records(dir: &Path, wanted: &[String]) -> CliResult<Vec<ProgressRecord>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(project) = file_name.strip_suffix(RECORD_SUFFIX) else {
            continue;
        };
        if !wanted.is_empty() && !wanted.iter().any(|w| w == project) {
            continue;
        }
        let content = fs::read_to_string(entry.path())?;
        match serde_json::from_str::<ProgressRecord>(&content) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(file = %entry.path().display(), error = %e, "unreadable progress record");
            }
        }
    }
    records.sort_by(|a, b| a.project_name.cmp(&b.project_name));
    Ok(records)
}

/// One status line per project.
fn render_record(record: &ProgressRecord) -> String {
    let status = match record.status {
        RunStatus::NotStarted => "not started",
        RunStatus::Running => "running",
        RunStatus::Completed => "completed",
    };
    let mut line = format!(
        "{}: {} {}/{} commits, {} successful",
        record.project_name,
        status,
        record.processed_commits.len(),
        record.total_commits,
        record.successful_commits
    );
    if let Some(pct) = record.progress_percentage {
        line.push_str(&format!(" ({pct:.0}%)"));
    }
    if let Some(secs) = record.execution_time_seconds {
        line.push_str(&format!(" in {secs:.2}s"));
    }
    line.push_str(&format!(", updated {}", format_epoch(record.last_update)));
    line
}

fn format_epoch(epoch: f64) -> String {
    DateTime::from_timestamp(epoch as i64, 0).map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
