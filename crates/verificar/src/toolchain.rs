//! JDK selection for build-tool invocations.
//!
//! A build is pinned to one JDK by handing the selected installation to the
//! spawned process as its `JAVA_HOME`. Selection is a pure lookup over a
//! configured version table; the parent process environment is never touched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// JDK versions available when none are configured explicitly.
pub const DEFAULT_JDK_VERSIONS: [u32; 3] = [8, 17, 21];

/// A selected JDK installation, threaded by value into each invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    version: u32,
    home: PathBuf,
}

impl Toolchain {
    /// JDK major version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Installation directory, the value spawned builds receive as
    /// `JAVA_HOME`.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }
}

/// Available JDK installations keyed by major version.
///
/// The table is never empty: `default()` seeds it and entries can only be
/// added or replaced, so selection always resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSet {
    homes: BTreeMap<u32, PathBuf>,
}

impl Default for ToolchainSet {
    fn default() -> Self {
        let mut homes = BTreeMap::new();
        for version in DEFAULT_JDK_VERSIONS {
            homes.insert(version, default_home(version));
        }
        Self { homes }
    }
}

impl ToolchainSet {
    /// Register or replace the installation for one JDK version.
    pub fn insert(&mut self, version: u32, home: impl Into<PathBuf>) {
        self.homes.insert(version, home.into());
    }

    /// Configured versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.homes.keys().copied()
    }

    /// Select the toolchain for a declared source/target version.
    ///
    /// `1.x` forms normalize to `x`. A missing or unconfigured declaration
    /// falls back to the lowest configured version.
    #[must_use]
    pub fn select(&self, declared: Option<&str>) -> Toolchain {
        if let Some(raw) = declared {
            let normalized = normalize_version(raw);
            if let Ok(version) = normalized.parse::<u32>() {
                if let Some(home) = self.homes.get(&version) {
                    return Toolchain {
                        version,
                        home: home.clone(),
                    };
                }
            }
            debug!(declared = %raw, "declared version not configured, using lowest");
        }
        self.lowest()
    }

    fn lowest(&self) -> Toolchain {
        self.homes.iter().next().map_or_else(
            || Toolchain {
                version: 8,
                home: default_home(8),
            },
            |(version, home)| Toolchain {
                version: *version,
                home: home.clone(),
            },
        )
    }
}

fn default_home(version: u32) -> PathBuf {
    PathBuf::from(format!("/usr/lib/jvm/java-{version}-openjdk-amd64"))
}

/// Normalize a legacy `1.x` version declaration to its major number.
fn normalize_version(declared: &str) -> &str {
    let declared = declared.trim();
    declared.strip_prefix("1.").unwrap_or(declared)
}
