//! External-tool adapter: git checkouts, Maven test runs, report reads.
//!
//! The verifier drives revisions through the [`RevisionExecutor`] trait;
//! [`GitMavenExecutor`] is the real implementation, spawning blocking
//! `git` and `mvn` processes inside an owned [`Workspace`]. No timeout is
//! enforced on an individual invocation, so a hung build stalls the batch
//! until the process is killed; the progress record makes that restart
//! cheap. A re-attempted commit starts from whatever the interrupted run
//! left in the working tree; the hard reset at checkout is what restores
//! it, nothing is pre-cleaned beyond that.

use std::fs;
use std::process::{Command, Output};

use tracing::{debug, warn};

use crate::coverage::CoverageReport;
use crate::method_id::MethodId;
use crate::pom;
use crate::result::{VerificarError, VerificarResult};
use crate::toolchain::{Toolchain, ToolchainSet};
use crate::work_item::Revision;
use crate::workspace::Workspace;

/// Revision-level operations the commit verifier needs.
///
/// `&mut self` throughout: every operation mutates the underlying working
/// directory, and the exclusive borrow keeps two callers from interleaving
/// on one checkout.
pub trait RevisionExecutor {
    /// Reset the working tree to one revision of a commit.
    fn checkout(&mut self, commit: &str, revision: Revision) -> VerificarResult<()>;

    /// Prepare the checkout for instrumented runs and select its JDK.
    ///
    /// Partial failures (unreadable descriptor, failed rewrite) are logged
    /// and absorbed; the returned toolchain is usable regardless.
    fn prepare(&mut self) -> Toolchain;

    /// Best-effort removal of prior build and report artifacts.
    fn clean(&mut self, toolchain: &Toolchain);

    /// Run one test method under instrumentation.
    ///
    /// A non-zero build-tool exit is a [`VerificarError::Tool`]; failure
    /// to spawn the tool at all surfaces as I/O.
    fn run_test(&mut self, test: &MethodId, toolchain: &Toolchain) -> VerificarResult<()>;

    /// Load the coverage report produced by the last instrumented run.
    ///
    /// Missing or unparseable reports read as empty, meaning nothing
    /// covered.
    fn read_report(&self) -> CoverageReport;
}

/// The git revision a checkout resolves to.
fn reset_target(commit: &str, revision: Revision) -> String {
    match revision {
        Revision::New => commit.to_string(),
        Revision::Old => format!("{commit}~1"),
    }
}

/// Executor backed by real `git` and `mvn` processes.
pub struct GitMavenExecutor {
    workspace: Workspace,
    toolchains: ToolchainSet,
}

impl GitMavenExecutor {
    /// Run tools inside `workspace`, selecting JDKs from `toolchains`.
    pub fn new(workspace: Workspace, toolchains: ToolchainSet) -> Self {
        Self {
            workspace,
            toolchains,
        }
    }

    fn git(&self, args: &[&str]) -> VerificarResult<Output> {
        debug!(dir = %self.workspace.dir().display(), ?args, "git");
        let output = Command::new("git")
            .args(args)
            .current_dir(self.workspace.dir())
            .output()?;
        Ok(output)
    }

    fn mvn(&self, args: &[&str], toolchain: &Toolchain) -> VerificarResult<Output> {
        debug!(dir = %self.workspace.dir().display(), ?args, jdk = toolchain.version(), "mvn");
        let output = Command::new("mvn")
            .args(args)
            .current_dir(self.workspace.dir())
            .env("JAVA_HOME", toolchain.home())
            .output()?;
        Ok(output)
    }
}

impl RevisionExecutor for GitMavenExecutor {
    fn checkout(&mut self, commit: &str, revision: Revision) -> VerificarResult<()> {
        let target = reset_target(commit, revision);
        let output = self.git(&["reset", "--hard", &target])?;
        if output.status.success() {
            if let Ok(show) = self.git(&["show", "--oneline", "-s", &target]) {
                debug!(
                    commit = %String::from_utf8_lossy(&show.stdout).trim(),
                    %revision,
                    "checked out"
                );
            }
            return Ok(());
        }
        if let Ok(status) = self.git(&["status", "--short"]) {
            warn!(
                tree = %String::from_utf8_lossy(&status.stdout).trim(),
                "working tree after failed reset"
            );
        }
        Err(VerificarError::tool(
            "git",
            format!(
                "reset --hard {target}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ))
    }

    fn prepare(&mut self) -> Toolchain {
        let pom_path = self.workspace.pom_path();
        let mut declared = None;
        match fs::read_to_string(&pom_path) {
            Ok(content) => {
                declared = pom::declared_java_version(&content);
                match pom::rewrite_for_coverage(&content) {
                    Ok((rewritten, stripped)) => {
                        if stripped {
                            debug!("stripped -SNAPSHOT from parent version");
                        }
                        if let Err(e) = fs::write(&pom_path, rewritten) {
                            warn!(pom = %pom_path.display(), error = %e, "could not write rewritten descriptor");
                        }
                    }
                    Err(e) => {
                        warn!(pom = %pom_path.display(), error = %e, "descriptor rewrite failed");
                    }
                }
            }
            Err(e) => {
                warn!(pom = %pom_path.display(), error = %e, "cannot read build descriptor");
            }
        }
        let toolchain = self.toolchains.select(declared.as_deref());
        debug!(
            declared = declared.as_deref().unwrap_or("none"),
            selected = toolchain.version(),
            home = %toolchain.home().display(),
            "toolchain selected"
        );
        toolchain
    }

    fn clean(&mut self, toolchain: &Toolchain) {
        match self.mvn(&["clean"], toolchain) {
            Ok(output) if !output.status.success() => {
                debug!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "mvn clean exited non-zero"
                );
            }
            Err(e) => debug!(error = %e, "mvn clean did not run"),
            Ok(_) => {}
        }
        let site = self.workspace.site_dir();
        match fs::remove_dir_all(&site) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(dir = %site.display(), error = %e, "could not remove report directory"),
        }
    }

    fn run_test(&mut self, test: &MethodId, toolchain: &Toolchain) -> VerificarResult<()> {
        let selector = test.test_selector();
        let test_arg = format!("-Dtest={selector}");
        let output = self.mvn(&["test", &test_arg, "-DskipTests=false"], toolchain)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(VerificarError::tool(
                "mvn",
                format!("test {selector} exited with {}", output.status),
            ))
        }
    }

    fn read_report(&self) -> CoverageReport {
        CoverageReport::load_or_empty(&self.workspace.report_path())
    }
}
