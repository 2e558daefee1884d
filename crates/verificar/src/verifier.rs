//! Commit verification protocol.
//!
//! Drives one commit through both of its revisions: switch the working
//! tree, prepare instrumentation, run each candidate test by itself, and
//! interpret the coverage report. Each revision must yield a minimum
//! number of covered (test, focal) pairs or the commit fails at that
//! revision's gate. Anything unexpected is caught at the commit boundary
//! and recorded as an `error` verdict, so one commit can never halt a
//! batch.

use tracing::{debug, info, warn};

use crate::executor::RevisionExecutor;
use crate::method_id::MethodId;
use crate::result::{VerificarError, VerificarResult};
use crate::results::{CoveredPair, FailureReason, VerificationResult};
use crate::toolchain::Toolchain;
use crate::work_item::{Revision, WorkItem};

/// Candidate-set size at or above which a commit is rejected unprocessed.
pub const MAX_CANDIDATE_METHODS: usize = 40;

/// Covered pairs each revision must yield.
pub const MIN_COVERED_PAIRS: usize = 2;

/// Protocol position, advanced as a commit moves through verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    /// Nothing attempted yet.
    Init,
    /// Working tree reset to the commit.
    SwitchedToNew,
    /// All new-revision candidate tests ran.
    NewTestsExecuted,
    /// New-revision pair count met the threshold.
    NewThresholdChecked,
    /// Working tree reset to the commit's parent.
    SwitchedToOld,
    /// All old-revision candidate tests ran.
    OldTestsExecuted,
    /// Old-revision pair count met the threshold.
    OldThresholdChecked,
    /// Both gates passed.
    Success,
}

/// Verifies commits one at a time against a revision executor.
pub struct CommitVerifier<E> {
    executor: E,
    state: VerifyState,
}

impl<E: RevisionExecutor> CommitVerifier<E> {
    /// Build a verifier over the given executor.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            state: VerifyState::Init,
        }
    }

    /// Where the protocol stopped for the most recent commit.
    #[must_use]
    pub fn state(&self) -> VerifyState {
        self.state
    }

    /// Run the full protocol for one commit.
    ///
    /// Never returns an error: unexpected failures become an
    /// `error`-status verdict for this commit alone.
    pub fn verify(&mut self, item: &WorkItem) -> VerificationResult {
        self.state = VerifyState::Init;
        if let Some(rejection) = self.admission_check(item) {
            return rejection;
        }
        match self.run_protocol(item) {
            Ok(result) => result,
            Err(e) => {
                warn!(commit = %item.sha(), error = %e, "verification aborted");
                VerificationResult::error(item.sha(), e.to_string())
            }
        }
    }

    /// Structural precondition check; costs no external work.
    fn admission_check(&self, item: &WorkItem) -> Option<VerificationResult> {
        let counts = [
            item.test_methods.new.len(),
            item.test_methods.old.len(),
            item.focal_methods.new.len(),
            item.focal_methods.old.len(),
        ];
        let oversized = counts.iter().any(|&n| n >= MAX_CANDIDATE_METHODS);
        let empty = counts.iter().any(|&n| n == 0);
        if oversized || empty {
            info!(
                commit = %item.sha(),
                new_tests = counts[0],
                old_tests = counts[1],
                new_focals = counts[2],
                old_focals = counts[3],
                "rejected before execution"
            );
            return Some(VerificationResult::failed(
                item.sha(),
                FailureReason::AdmissionRejected,
            ));
        }
        None
    }

    fn run_protocol(&mut self, item: &WorkItem) -> VerificarResult<VerificationResult> {
        let sha = item.sha();

        if let Err(e) = self.executor.checkout(sha, Revision::New) {
            warn!(commit = %sha, error = %e, "could not switch to commit");
            return Ok(VerificationResult::failed(
                sha,
                FailureReason::FailedToSwitchCommit,
            ));
        }
        self.advance(VerifyState::SwitchedToNew);
        let toolchain = self.executor.prepare();
        let new_pairs = self.run_revision(item, Revision::New, &toolchain)?;
        self.advance(VerifyState::NewTestsExecuted);
        if new_pairs.len() < MIN_COVERED_PAIRS {
            info!(commit = %sha, pairs = new_pairs.len(), "insufficient new-revision coverage");
            return Ok(VerificationResult::failed(
                sha,
                FailureReason::NewCoverageLessThan2,
            ));
        }
        self.advance(VerifyState::NewThresholdChecked);

        if let Err(e) = self.executor.checkout(sha, Revision::Old) {
            warn!(commit = %sha, error = %e, "could not switch to parent commit");
            return Ok(VerificationResult::failed(
                sha,
                FailureReason::FailedToSwitchToPrevCommit,
            ));
        }
        self.advance(VerifyState::SwitchedToOld);
        let toolchain = self.executor.prepare();
        let old_pairs = self.run_revision(item, Revision::Old, &toolchain)?;
        self.advance(VerifyState::OldTestsExecuted);
        if old_pairs.len() < MIN_COVERED_PAIRS {
            info!(commit = %sha, pairs = old_pairs.len(), "insufficient old-revision coverage");
            return Ok(VerificationResult::failed(
                sha,
                FailureReason::OldCoverageLessThan2,
            ));
        }
        self.advance(VerifyState::OldThresholdChecked);

        self.advance(VerifyState::Success);
        info!(
            commit = %sha,
            new_pairs = new_pairs.len(),
            old_pairs = old_pairs.len(),
            "commit verified"
        );
        Ok(VerificationResult::success(sha, new_pairs, old_pairs))
    }

    /// Run every candidate test of one revision and collect covered pairs.
    ///
    /// Per-test execution failures skip that test. Spawn-level failures
    /// propagate to the commit boundary.
    fn run_revision(
        &mut self,
        item: &WorkItem,
        revision: Revision,
        toolchain: &Toolchain,
    ) -> VerificarResult<Vec<CoveredPair>> {
        let tests = item.test_methods.for_revision(revision);
        let focals = item.focal_methods.for_revision(revision);
        let mut pairs = Vec::new();
        for test_id in tests {
            let test = match MethodId::parse(test_id) {
                Ok(test) => test,
                Err(e) => {
                    warn!(%revision, method_id = %test_id, error = %e, "unparseable test identifier, skipping");
                    continue;
                }
            };
            self.executor.clean(toolchain);
            match self.executor.run_test(&test, toolchain) {
                Ok(()) => {}
                Err(VerificarError::Tool { .. }) => {
                    debug!(%revision, test = %test_id, "test execution failed, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            }
            let report = self.executor.read_report();
            for focal_id in report.covered_methods(focals) {
                debug!(%revision, test = %test_id, focal = %focal_id, "covered pair");
                pairs.push(CoveredPair {
                    test_method_id: test_id.clone(),
                    focal_method_id: focal_id,
                });
            }
        }
        Ok(pairs)
    }

    fn advance(&mut self, next: VerifyState) {
        debug!(from = ?self.state, to = ?next, "protocol state");
        self.state = next;
    }
}
