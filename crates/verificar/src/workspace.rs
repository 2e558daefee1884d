//! Exclusive handle on a project working directory.

use std::path::{Path, PathBuf};

/// Coverage report location relative to the working directory.
const REPORT_RELATIVE: &str = "target/site/jacoco/jacoco.xml";

/// Report output directory removed between test runs.
const SITE_RELATIVE: &str = "target/site";

/// An owned project working directory.
///
/// Deliberately not `Clone`: one checkout has exactly one writer, and the
/// checkout state (current revision, build artifacts) is mutable shared
/// state for everything running inside it.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Take ownership of a working directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory external tools run in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.root
    }

    /// Path of the build descriptor.
    #[must_use]
    pub fn pom_path(&self) -> PathBuf {
        self.root.join("pom.xml")
    }

    /// Path of the coverage report produced by an instrumented run.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_RELATIVE)
    }

    /// Report output directory, removed wholesale during clean.
    #[must_use]
    pub fn site_dir(&self) -> PathBuf {
        self.root.join(SITE_RELATIVE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted() {
        let ws = Workspace::new("/work/acme");
        assert_eq!(ws.dir(), Path::new("/work/acme"));
        assert_eq!(ws.pom_path(), Path::new("/work/acme/pom.xml"));
        assert_eq!(
            ws.report_path(),
            Path::new("/work/acme/target/site/jacoco/jacoco.xml")
        );
        assert_eq!(ws.site_dir(), Path::new("/work/acme/target/site"));
    }
}
