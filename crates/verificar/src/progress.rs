//! Persisted per-project progress for resumable batch runs.
//!
//! The record on disk is the recovery contract: it is saved before each
//! commit is attempted and again after it completes, so a killed run
//! resumes by re-attempting at most the one in-flight commit. Records are
//! plain JSON, safe to inspect or delete by hand to force a from-scratch
//! restart of a single project.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::result::VerificarResult;

/// Lifecycle of one project's batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No persisted record yet.
    NotStarted,
    /// At least one commit attempted, not all finished.
    Running,
    /// Every work item processed.
    Completed,
}

/// On-disk progress state for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Project this record belongs to.
    pub project_name: String,
    /// Where the run stands.
    pub status: RunStatus,
    /// Commit hashes already attempted, in completion order.
    pub processed_commits: Vec<String>,
    /// Index of the commit being (or about to be) attempted.
    pub current_index: usize,
    /// Epoch seconds when the run first started.
    pub start_time: f64,
    /// Epoch seconds of the last save.
    pub last_update: f64,
    /// Work items known at initialization.
    pub total_commits: usize,
    /// Commits that verified successfully.
    pub successful_commits: usize,
    /// Epoch seconds when the run completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Elapsed seconds of the completing run, rounded to two decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_seconds: Option<f64>,
    /// Always 100.0 once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
}

impl ProgressRecord {
    /// A record for a project with no persisted state.
    #[must_use]
    pub fn fresh(project: &str, total_commits: usize) -> Self {
        let now = epoch_seconds();
        Self {
            project_name: project.to_string(),
            status: RunStatus::NotStarted,
            processed_commits: Vec::new(),
            current_index: 0,
            start_time: now,
            last_update: now,
            total_commits,
            successful_commits: 0,
            end_time: None,
            execution_time_seconds: None,
            progress_percentage: None,
        }
    }

    /// Whether a commit was already attempted in an earlier run.
    #[must_use]
    pub fn is_processed(&self, commit_id: &str) -> bool {
        self.processed_commits.iter().any(|c| c == commit_id)
    }

    /// Finalize the record after the last work item.
    ///
    /// `run_elapsed` is the elapsed wall-clock time of the run that
    /// finished the project, not the cumulative time across resumes.
    pub fn mark_completed(&mut self, run_elapsed: f64) {
        self.status = RunStatus::Completed;
        self.end_time = Some(epoch_seconds());
        self.execution_time_seconds = Some((run_elapsed * 100.0).round() / 100.0);
        self.progress_percentage = Some(100.0);
    }
}

/// Loads and atomically saves progress records under one directory.
#[derive(Debug)]
pub struct ProgressTracker {
    dir: PathBuf,
}

impl ProgressTracker {
    /// Track progress under the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of one project's record file.
    #[must_use]
    pub fn record_path(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}_progress.json"))
    }

    /// Load the persisted record, or a fresh one when none exists.
    ///
    /// A corrupt or unreadable record is not fatal: it is logged and the
    /// project starts over. `total_commits` seeds fresh records only;
    /// resumed records keep their persisted value.
    #[must_use]
    pub fn load(&self, project: &str, total_commits: usize) -> ProgressRecord {
        let path = self.record_path(project);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(project, "no progress record, starting fresh");
                return ProgressRecord::fresh(project, total_commits);
            }
            Err(e) => {
                warn!(project, error = %e, "progress record unreadable, starting fresh");
                return ProgressRecord::fresh(project, total_commits);
            }
        };
        match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(project, error = %e, "progress record corrupt, starting fresh");
                ProgressRecord::fresh(project, total_commits)
            }
        }
    }

    /// Persist the record atomically (temp file + rename), stamping its
    /// last-update time.
    pub fn save(&self, record: &mut ProgressRecord) -> VerificarResult<()> {
        record.last_update = epoch_seconds();
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&record.project_name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Current wall-clock time as fractional epoch seconds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
