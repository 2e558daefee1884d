//! Commit descriptors and per-project work-item loading.
//!
//! Each project contributes one JSON file of commit descriptors, produced
//! upstream. A descriptor names a commit and, for both of its revisions,
//! the candidate test methods and focal methods to verify against each
//! other.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::result::{VerificarError, VerificarResult};

/// One of the two code states associated with a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// The commit itself (post-change).
    New,
    /// The commit's immediate parent (pre-change).
    Old,
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::Old => f.write_str("old"),
        }
    }
}

/// Commit identity as carried in the work-item file.
///
/// Upstream writes additional bookkeeping fields into this object; only the
/// hash is consumed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitRef {
    /// Full commit hash.
    pub sha1: String,
}

/// Method identifier sets for both revisions of a commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevisionSets {
    /// Identifiers for the commit itself.
    #[serde(default)]
    pub new: Vec<String>,
    /// Identifiers for the commit's parent.
    #[serde(default)]
    pub old: Vec<String>,
}

impl RevisionSets {
    /// The identifier set for one revision.
    pub fn for_revision(&self, revision: Revision) -> &[String] {
        match revision {
            Revision::New => &self.new,
            Revision::Old => &self.old,
        }
    }
}

/// One unit of work: a commit plus its candidate method sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItem {
    /// The commit under verification.
    pub commit: CommitRef,
    /// Candidate focal methods per revision.
    pub focal_methods: RevisionSets,
    /// Candidate test methods per revision.
    pub test_methods: RevisionSets,
}

impl WorkItem {
    /// The commit hash.
    pub fn sha(&self) -> &str {
        &self.commit.sha1
    }
}

/// Suffix of per-project work-item files under the commits directory.
pub const WORK_ITEM_SUFFIX: &str = "-valid.json";

/// A project eligible for processing: a checked-out working directory plus
/// its work-item file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    /// Project name (directory name under the projects root).
    pub name: String,
    /// Working directory containing the project's repository.
    pub project_dir: PathBuf,
    /// Path to the project's work-item file.
    pub work_items_file: PathBuf,
}

/// Load the ordered work-item list for one project.
pub fn load_work_items(project: &str, path: &Path) -> VerificarResult<Vec<WorkItem>> {
    let content = fs::read_to_string(path)
        .map_err(|e| VerificarError::work_items(project, format!("{}: {e}", path.display())))?;
    let items: Vec<WorkItem> = serde_json::from_str(&content)
        .map_err(|e| VerificarError::work_items(project, format!("{}: {e}", path.display())))?;
    Ok(items)
}

/// Discover processable projects.
///
/// Every subdirectory of `projects_root` is a candidate; those without a
/// matching `<name>-valid.json` under `commits_dir` are skipped with a
/// warning. Results are name-sorted so batch order is stable across runs.
pub fn discover_projects(
    projects_root: &Path,
    commits_dir: &Path,
) -> VerificarResult<Vec<ProjectSpec>> {
    let entries = fs::read_dir(projects_root).map_err(|e| {
        VerificarError::config(format!(
            "cannot read projects root {}: {e}",
            projects_root.display()
        ))
    })?;

    let mut projects = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let work_items_file = commits_dir.join(format!("{name}{WORK_ITEM_SUFFIX}"));
        if !work_items_file.is_file() {
            warn!(project = %name, file = %work_items_file.display(), "no work-item file, skipping project");
            continue;
        }
        projects.push(ProjectSpec {
            name,
            project_dir: entry.path(),
            work_items_file,
        });
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}
