//! Verificar: Coverage-Verified Test/Focal-Method Pair Extraction
//!
//! Verificar (Spanish: "to verify") walks the commit history of Maven
//! projects and keeps only the (test method, focal method) pairs whose
//! link is proven by JaCoCo instrumentation, on both sides of each commit.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     VERIFICAR Pipeline                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐  │
//! │  │ Work Item │   │ Commit    │   │ Revision  │   │ git / mvn │  │
//! │  │ Lists     │──►│ Verifier  │──►│ Executor  │──►│ + JaCoCo  │  │
//! │  │ (JSON)    │   │ (2-phase) │   │ (trait)   │   │ (extern)  │  │
//! │  └───────────┘   └───────────┘   └───────────┘   └───────────┘  │
//! │        │               │                                        │
//! │        ▼               ▼                                        │
//! │  ┌───────────┐   ┌───────────┐                                  │
//! │  │ Progress  │   │ Covered   │                                  │
//! │  │ Records   │   │ Pairs     │                                  │
//! │  └───────────┘   └───────────┘                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The driver checkpoints progress around every commit, so a batch killed
//! hours in resumes where it stopped instead of starting over.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod coverage;
pub mod driver;
pub mod executor;
pub mod method_id;
pub mod pom;
pub mod progress;
pub mod result;
pub mod results;
pub mod toolchain;
pub mod verifier;
pub mod work_item;
pub mod workspace;

pub use coverage::{
    ClassCoverage, CoverageCounter, CoverageReport, MethodCoverage, PackageCoverage,
};
pub use driver::{BatchDriver, BatchSummary, ProjectSummary};
pub use executor::{GitMavenExecutor, RevisionExecutor};
pub use method_id::MethodId;
pub use progress::{ProgressRecord, ProgressTracker, RunStatus};
pub use result::{VerificarError, VerificarResult};
pub use results::{
    CoveredPair, FailureReason, ResultAccumulator, VerdictStatus, VerificationResult,
};
pub use toolchain::{Toolchain, ToolchainSet, DEFAULT_JDK_VERSIONS};
pub use verifier::{CommitVerifier, VerifyState, MAX_CANDIDATE_METHODS, MIN_COVERED_PAIRS};
pub use work_item::{
    discover_projects, load_work_items, CommitRef, ProjectSpec, Revision, RevisionSets, WorkItem,
    WORK_ITEM_SUFFIX,
};
pub use workspace::Workspace;
