//! Verification verdicts and their on-disk accumulation.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::result::VerificarResult;

/// Outcome class of one commit's verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// Both revisions met the coverage threshold.
    Success,
    /// Rejected or below threshold; `reason` says why.
    Failed,
    /// An unexpected error interrupted the protocol.
    Error,
}

/// Why a commit failed, short of an unexpected error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Candidate sets too large or empty; nothing was executed.
    AdmissionRejected,
    /// Could not reset the working tree to the commit.
    FailedToSwitchCommit,
    /// Could not reset the working tree to the commit's parent.
    FailedToSwitchToPrevCommit,
    /// Fewer than the minimum covered pairs on the new revision.
    #[serde(rename = "new_coverage_less_than_2")]
    NewCoverageLessThan2,
    /// Fewer than the minimum covered pairs on the old revision.
    #[serde(rename = "old_coverage_less_than_2")]
    OldCoverageLessThan2,
}

impl FailureReason {
    /// Wire string of this reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdmissionRejected => "admission_rejected",
            Self::FailedToSwitchCommit => "failed_to_switch_commit",
            Self::FailedToSwitchToPrevCommit => "failed_to_switch_to_prev_commit",
            Self::NewCoverageLessThan2 => "new_coverage_less_than_2",
            Self::OldCoverageLessThan2 => "old_coverage_less_than_2",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (test, focal) pair observed covered in one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveredPair {
    /// Identifier of the test method that ran.
    pub test_method_id: String,
    /// Identifier of the focal method it covered.
    pub focal_method_id: String,
}

/// Persisted verdict for one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Commit hash.
    pub commit: String,
    /// Covered pairs observed on the new revision.
    pub new_pairs: Vec<CoveredPair>,
    /// Covered pairs observed on the old revision.
    pub old_pairs: Vec<CoveredPair>,
    /// Outcome class.
    pub status: VerdictStatus,
    /// Failure reason, present on `failed` records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Error text, present on `error` records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl VerificationResult {
    /// A verdict with both revisions' covered pairs.
    #[must_use]
    pub fn success(
        commit: impl Into<String>,
        new_pairs: Vec<CoveredPair>,
        old_pairs: Vec<CoveredPair>,
    ) -> Self {
        Self {
            commit: commit.into(),
            new_pairs,
            old_pairs,
            status: VerdictStatus::Success,
            reason: None,
            error_message: None,
        }
    }

    /// A failed verdict. Pair lists are empty by convention.
    #[must_use]
    pub fn failed(commit: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            commit: commit.into(),
            new_pairs: Vec::new(),
            old_pairs: Vec::new(),
            status: VerdictStatus::Failed,
            reason: Some(reason),
            error_message: None,
        }
    }

    /// A verdict for a commit whose protocol was interrupted.
    #[must_use]
    pub fn error(commit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            commit: commit.into(),
            new_pairs: Vec::new(),
            old_pairs: Vec::new(),
            status: VerdictStatus::Error,
            reason: None,
            error_message: Some(message.into()),
        }
    }

    /// Whether the commit verified successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == VerdictStatus::Success
    }
}

/// Upserting store of verification results, one JSON array per project.
#[derive(Debug)]
pub struct ResultAccumulator {
    dir: PathBuf,
}

impl ResultAccumulator {
    /// Accumulate results under the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of one project's result file.
    #[must_use]
    pub fn results_path(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}_covered_pairs.json"))
    }

    /// Load the persisted collection.
    ///
    /// A missing file is an empty collection; a corrupt one degrades to
    /// empty with a warning, accepting the loss over aborting the batch.
    #[must_use]
    pub fn load(&self, project: &str) -> Vec<VerificationResult> {
        let path = self.results_path(project);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(project, error = %e, "result file unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&content) {
            Ok(results) => results,
            Err(e) => {
                warn!(project, error = %e, "result file corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Upsert one result by commit hash and persist the collection.
    ///
    /// A record for the same commit is replaced in place, keeping its
    /// position; otherwise the result is appended. Re-attempted commits
    /// therefore never produce duplicates.
    pub fn append(&self, project: &str, result: VerificationResult) -> VerificarResult<()> {
        let mut results = self.load(project);
        match results.iter_mut().find(|r| r.commit == result.commit) {
            Some(slot) => *slot = result,
            None => results.push(result),
        }
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.results_path(project),
            serde_json::to_string_pretty(&results)?,
        )?;
        Ok(())
    }
}
