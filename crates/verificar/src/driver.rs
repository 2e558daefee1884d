//! Batch orchestration across projects and commits.
//!
//! The driver owns the recovery contract: the progress record is saved
//! before each commit is attempted and again after its result lands, so a
//! killed batch resumes by re-attempting at most one commit. Because
//! results are upserted by commit hash, that re-attempt is idempotent.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::executor::RevisionExecutor;
use crate::progress::{ProgressTracker, RunStatus};
use crate::result::VerificarResult;
use crate::results::ResultAccumulator;
use crate::verifier::CommitVerifier;
use crate::work_item::{load_work_items, ProjectSpec};

/// Outcome counts for one project in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSummary {
    /// Project name.
    pub project: String,
    /// Work items in the project's list.
    pub total: usize,
    /// Commits attempted in this run.
    pub processed: usize,
    /// Of those, commits that verified successfully.
    pub succeeded: usize,
    /// Commits an earlier run already covered.
    pub skipped: usize,
}

/// Outcome counts for a whole batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Per-project outcomes, in processing order.
    pub projects: Vec<ProjectSummary>,
    /// Projects whose work-item file could not be read.
    pub unreadable_projects: usize,
}

impl BatchSummary {
    /// Commits attempted across all projects.
    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.projects.iter().map(|p| p.processed).sum()
    }

    /// Successful commits across all projects.
    #[must_use]
    pub fn total_succeeded(&self) -> usize {
        self.projects.iter().map(|p| p.succeeded).sum()
    }
}

/// Runs the verification batch over discovered projects.
#[derive(Debug)]
pub struct BatchDriver {
    tracker: ProgressTracker,
    accumulator: ResultAccumulator,
}

impl BatchDriver {
    /// Drive the batch with the given progress and result stores.
    pub fn new(tracker: ProgressTracker, accumulator: ResultAccumulator) -> Self {
        Self {
            tracker,
            accumulator,
        }
    }

    /// Process every project in order.
    ///
    /// `make_executor` builds one executor per project, bound to that
    /// project's working directory. A project whose work items cannot be
    /// read is logged and skipped; it never stops the batch.
    pub fn run<E, F>(&self, projects: &[ProjectSpec], mut make_executor: F) -> BatchSummary
    where
        E: RevisionExecutor,
        F: FnMut(&ProjectSpec) -> E,
    {
        let mut summary = BatchSummary::default();
        for project in projects {
            info!(project = %project.name, dir = %project.project_dir.display(), "processing project");
            let executor = make_executor(project);
            match self.run_project(project, executor) {
                Ok(outcome) => summary.projects.push(outcome),
                Err(e) => {
                    error!(project = %project.name, error = %e, "project skipped");
                    summary.unreadable_projects += 1;
                }
            }
        }
        summary
    }

    fn run_project<E: RevisionExecutor>(
        &self,
        project: &ProjectSpec,
        executor: E,
    ) -> VerificarResult<ProjectSummary> {
        let run_started = Instant::now();
        let items = load_work_items(&project.name, &project.work_items_file)?;
        let mut record = self.tracker.load(&project.name, items.len());
        let mut summary = ProjectSummary {
            project: project.name.clone(),
            total: items.len(),
            ..ProjectSummary::default()
        };

        if record.status == RunStatus::Completed {
            info!(project = %project.name, "already completed, skipping");
            summary.skipped = items.len();
            return Ok(summary);
        }

        let first_index = record.current_index;
        if first_index > 0 || !record.processed_commits.is_empty() {
            info!(
                project = %project.name,
                index = first_index,
                done = record.processed_commits.len(),
                "resuming from checkpoint"
            );
        }
        record.status = RunStatus::Running;
        summary.skipped = first_index;

        let mut verifier = CommitVerifier::new(executor);
        for (index, item) in items.iter().enumerate().skip(first_index) {
            if record.is_processed(item.sha()) {
                debug!(project = %project.name, commit = %item.sha(), "already processed, skipping");
                summary.skipped += 1;
                continue;
            }

            record.current_index = index;
            if let Err(e) = self.tracker.save(&mut record) {
                warn!(project = %project.name, error = %e, "could not checkpoint before commit");
            }

            info!(
                project = %project.name,
                commit = %item.sha(),
                position = index + 1,
                total = items.len(),
                "verifying commit"
            );
            let result = verifier.verify(item);
            let succeeded = result.is_success();
            if let Err(e) = self.accumulator.append(&project.name, result) {
                warn!(project = %project.name, commit = %item.sha(), error = %e, "could not persist result");
            }

            record.processed_commits.push(item.sha().to_string());
            if succeeded {
                record.successful_commits += 1;
                summary.succeeded += 1;
            }
            summary.processed += 1;
            if let Err(e) = self.tracker.save(&mut record) {
                warn!(project = %project.name, error = %e, "could not checkpoint after commit");
            }
        }

        record.mark_completed(run_started.elapsed().as_secs_f64());
        if let Err(e) = self.tracker.save(&mut record) {
            warn!(project = %project.name, error = %e, "could not persist completion");
        }
        info!(
            project = %project.name,
            total = summary.total,
            processed = summary.processed,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            elapsed_seconds = record.execution_time_seconds.unwrap_or_default(),
            "project complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use tempfile::TempDir;

    use crate::coverage::CoverageReport;
    use crate::method_id::MethodId;
    use crate::progress::ProgressRecord;
    use crate::result::VerificarError;
    use crate::results::{VerdictStatus, VerificationResult};
    use crate::toolchain::{Toolchain, ToolchainSet};
    use crate::work_item::{CommitRef, Revision, RevisionSets, WorkItem};

    const TEST_ID: &str = "com.example.FooTest.testBar()";
    const FOCAL_ID: &str = "com.example.Foo.bar(int)";

    /// Fails every checkout, so each commit is processed but unsuccessful.
    /// Optionally snapshots the on-disk progress record at each checkout.
    #[derive(Default)]
    struct RecordingExecutor {
        checkouts: Rc<RefCell<Vec<String>>>,
        progress_path: Option<PathBuf>,
        observed: Rc<RefCell<Vec<(usize, usize)>>>,
    }

    impl RevisionExecutor for RecordingExecutor {
        fn checkout(&mut self, commit: &str, revision: Revision) -> VerificarResult<()> {
            self.checkouts
                .borrow_mut()
                .push(format!("{revision} {commit}"));
            if let Some(path) = &self.progress_path {
                let record: ProgressRecord =
                    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
                self.observed
                    .borrow_mut()
                    .push((record.current_index, record.processed_commits.len()));
            }
            Err(VerificarError::tool("git", "offline"))
        }

        fn prepare(&mut self) -> Toolchain {
            ToolchainSet::default().select(None)
        }

        fn clean(&mut self, _toolchain: &Toolchain) {}

        fn run_test(&mut self, _test: &MethodId, _toolchain: &Toolchain) -> VerificarResult<()> {
            Ok(())
        }

        fn read_report(&self) -> CoverageReport {
            CoverageReport::default()
        }
    }

    fn work_item(sha: &str) -> WorkItem {
        let ids = |id: &str| vec![id.to_string()];
        WorkItem {
            commit: CommitRef {
                sha1: sha.to_string(),
            },
            focal_methods: RevisionSets {
                new: ids(FOCAL_ID),
                old: ids(FOCAL_ID),
            },
            test_methods: RevisionSets {
                new: ids(TEST_ID),
                old: ids(TEST_ID),
            },
        }
    }

    fn make_project(root: &Path, commits_dir: &Path, name: &str, shas: &[&str]) -> ProjectSpec {
        let project_dir = root.join(name);
        fs::create_dir_all(&project_dir).unwrap();
        fs::create_dir_all(commits_dir).unwrap();
        let items: Vec<WorkItem> = shas.iter().map(|sha| work_item(sha)).collect();
        let work_items_file = commits_dir.join(format!("{name}-valid.json"));
        fs::write(&work_items_file, serde_json::to_string(&items).unwrap()).unwrap();
        ProjectSpec {
            name: name.to_string(),
            project_dir,
            work_items_file,
        }
    }

    struct Fixture {
        _temp: TempDir,
        progress_dir: PathBuf,
        output_dir: PathBuf,
        projects_root: PathBuf,
        commits_dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().to_path_buf();
            Self {
                _temp: temp,
                progress_dir: root.join("progress"),
                output_dir: root.join("output"),
                projects_root: root.join("projects"),
                commits_dir: root.join("commits"),
            }
        }

        fn driver(&self) -> BatchDriver {
            BatchDriver::new(
                ProgressTracker::new(&self.progress_dir),
                ResultAccumulator::new(&self.output_dir),
            )
        }

        fn tracker(&self) -> ProgressTracker {
            ProgressTracker::new(&self.progress_dir)
        }

        fn accumulator(&self) -> ResultAccumulator {
            ResultAccumulator::new(&self.output_dir)
        }
    }

    #[test]
    fn test_fresh_run_completes_project() {
        let fx = Fixture::new();
        let project = make_project(&fx.projects_root, &fx.commits_dir, "acme", &["s0", "s1", "s2"]);
        let checkouts = Rc::new(RefCell::new(Vec::new()));

        let summary = fx.driver().run(std::slice::from_ref(&project), |_| {
            RecordingExecutor {
                checkouts: Rc::clone(&checkouts),
                ..RecordingExecutor::default()
            }
        });

        assert_eq!(summary.projects.len(), 1);
        let outcome = &summary.projects[0];
        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(*checkouts.borrow(), vec!["new s0", "new s1", "new s2"]);

        let record = fx.tracker().load("acme", 0);
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.processed_commits, vec!["s0", "s1", "s2"]);
        assert_eq!(record.successful_commits, 0);
        assert_eq!(record.progress_percentage, Some(100.0));

        let results = fx.accumulator().load("acme");
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == VerdictStatus::Failed));
    }

    #[test]
    fn test_resume_starts_at_cursor() {
        let fx = Fixture::new();
        let project = make_project(&fx.projects_root, &fx.commits_dir, "acme", &["s0", "s1", "s2"]);

        // checkpoint left by an interrupted run: s0 finished, s1 in flight
        let mut seed = ProgressRecord::fresh("acme", 3);
        seed.status = RunStatus::Running;
        seed.current_index = 1;
        seed.processed_commits.push("s0".to_string());
        fx.tracker().save(&mut seed).unwrap();
        fx.accumulator()
            .append("acme", VerificationResult::error("s0", "earlier run"))
            .unwrap();
        fx.accumulator()
            .append("acme", VerificationResult::error("s1", "interrupted"))
            .unwrap();

        let checkouts = Rc::new(RefCell::new(Vec::new()));
        let summary = fx.driver().run(std::slice::from_ref(&project), |_| {
            RecordingExecutor {
                checkouts: Rc::clone(&checkouts),
                ..RecordingExecutor::default()
            }
        });

        // s0 is never re-executed; s1 is re-attempted
        assert_eq!(*checkouts.borrow(), vec!["new s1", "new s2"]);
        let outcome = &summary.projects[0];
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.processed, 2);

        // the re-attempt replaced the interrupted record in place
        let results = fx.accumulator().load("acme");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].commit, "s0");
        assert_eq!(results[0].status, VerdictStatus::Error);
        assert_eq!(results[1].commit, "s1");
        assert_eq!(results[1].status, VerdictStatus::Failed);
        assert_eq!(results[2].commit, "s2");

        let record = fx.tracker().load("acme", 0);
        assert_eq!(record.processed_commits, vec!["s0", "s1", "s2"]);
    }

    #[test]
    fn test_processed_commit_at_cursor_not_reexecuted() {
        let fx = Fixture::new();
        let project = make_project(&fx.projects_root, &fx.commits_dir, "acme", &["s0", "s1"]);

        // killed after the post-commit save of s0: cursor still points at it
        let mut seed = ProgressRecord::fresh("acme", 2);
        seed.status = RunStatus::Running;
        seed.current_index = 0;
        seed.processed_commits.push("s0".to_string());
        seed.successful_commits = 1;
        fx.tracker().save(&mut seed).unwrap();

        let checkouts = Rc::new(RefCell::new(Vec::new()));
        let summary = fx.driver().run(std::slice::from_ref(&project), |_| {
            RecordingExecutor {
                checkouts: Rc::clone(&checkouts),
                ..RecordingExecutor::default()
            }
        });

        assert_eq!(*checkouts.borrow(), vec!["new s1"]);
        let outcome = &summary.projects[0];
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.processed, 1);

        let record = fx.tracker().load("acme", 0);
        // no duplicate entry, no counter inflation for the skipped commit
        assert_eq!(record.processed_commits, vec!["s0", "s1"]);
        assert_eq!(record.successful_commits, 1);
    }

    #[test]
    fn test_completed_project_untouched() {
        let fx = Fixture::new();
        let project = make_project(&fx.projects_root, &fx.commits_dir, "acme", &["s0", "s1"]);

        let mut seed = ProgressRecord::fresh("acme", 2);
        seed.mark_completed(1.0);
        fx.tracker().save(&mut seed).unwrap();

        let checkouts = Rc::new(RefCell::new(Vec::new()));
        let summary = fx.driver().run(std::slice::from_ref(&project), |_| {
            RecordingExecutor {
                checkouts: Rc::clone(&checkouts),
                ..RecordingExecutor::default()
            }
        });

        assert!(checkouts.borrow().is_empty());
        let outcome = &summary.projects[0];
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_unreadable_work_items_skips_project() {
        let fx = Fixture::new();
        let good = make_project(&fx.projects_root, &fx.commits_dir, "good", &["s0"]);
        let broken = make_project(&fx.projects_root, &fx.commits_dir, "broken", &["s0"]);
        fs::write(&broken.work_items_file, "{ not json").unwrap();

        let summary = fx
            .driver()
            .run(&[broken, good], |_| RecordingExecutor::default());

        assert_eq!(summary.unreadable_projects, 1);
        assert_eq!(summary.projects.len(), 1);
        assert_eq!(summary.projects[0].project, "good");
        assert_eq!(summary.projects[0].processed, 1);
    }

    #[test]
    fn test_checkpoint_saved_before_each_commit() {
        let fx = Fixture::new();
        let project = make_project(&fx.projects_root, &fx.commits_dir, "acme", &["s0", "s1", "s2"]);
        let observed = Rc::new(RefCell::new(Vec::new()));
        let progress_path = fx.tracker().record_path("acme");

        fx.driver().run(std::slice::from_ref(&project), |_| {
            RecordingExecutor {
                progress_path: Some(progress_path.clone()),
                observed: Rc::clone(&observed),
                ..RecordingExecutor::default()
            }
        });

        // at each checkout the on-disk cursor already names the in-flight
        // commit, and earlier commits are all recorded as processed
        assert_eq!(*observed.borrow(), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_summary_totals() {
        let fx = Fixture::new();
        let alpha = make_project(&fx.projects_root, &fx.commits_dir, "alpha", &["s0"]);
        let beta = make_project(&fx.projects_root, &fx.commits_dir, "beta", &["s0", "s1"]);

        let summary = fx
            .driver()
            .run(&[alpha, beta], |_| RecordingExecutor::default());

        assert_eq!(summary.total_processed(), 3);
        assert_eq!(summary.total_succeeded(), 0);
    }
}
