//! Version registry: the owner of every concrete package version.
//!
//! Package metadata never owns versions. It holds [`VersionId`] handles minted
//! by a [`VersionRegistry`], and asks the registry to compare, classify or
//! retire them.

mod compare;
mod pool;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub use compare::compare_versions;
pub use pool::VersionPool;

/// Repository label reserved for entries synthesized from the installed database.
pub const INSTALLED_REPO: &str = "_installed";

/// Opaque handle to a version living in a [`VersionRegistry`].
///
/// Handles are never reused, so a stale handle can be detected but never
/// aliases a newer version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionId(pub(crate) usize);

/// Repository-declared stability of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trust {
    /// Production release ("curr")
    #[default]
    Curr,
    /// Experimental release
    Test,
}

impl Trust {
    pub fn label(self) -> &'static str {
        match self {
            Trust::Curr => "Curr",
            Trust::Test => "Test",
        }
    }
}

impl fmt::Display for Trust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trust::Curr => write!(f, "curr"),
            Trust::Test => write!(f, "test"),
        }
    }
}

impl FromStr for Trust {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "curr" | "stable" => Ok(Trust::Curr),
            "test" | "exp" => Ok(Trust::Test),
            _ => anyhow::bail!("Unknown trust level: {}. Expected curr or test.", s),
        }
    }
}

/// A downloadable archive and the mirrors that carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Path relative to the local package directory (and to each site)
    #[serde(default)]
    pub path: String,
    /// Expected size in bytes, 0 when unknown
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sites: Vec<String>,
}

impl Archive {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Everything a loader knows about one version of a package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageData {
    pub version: String,
    pub vendor: String,
    pub repo_name: String,
    pub stability: Option<Trust>,
    pub sdesc: String,
    pub ldesc: String,
    pub depends: Vec<String>,
    pub archive: Archive,
    pub source: Option<Archive>,
}

/// A concrete version, owned by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageVersion {
    pub name: String,
    pub canonical_version: String,
    pub vendor: String,
    pub repo_name: String,
    pub stability: Option<Trust>,
    pub sdesc: String,
    pub ldesc: String,
    pub depends: Vec<String>,
    pub archive: Archive,
    pub source: Option<Archive>,
    accessible: bool,
    source_accessible: bool,
}

impl PackageVersion {
    pub fn new(name: &str, data: PackageData) -> Self {
        let accessible = !data.archive.is_empty() && !data.archive.sites.is_empty();
        let source_accessible = data
            .source
            .as_ref()
            .is_some_and(|s| !s.is_empty() && !s.sites.is_empty());

        PackageVersion {
            name: name.to_string(),
            canonical_version: data.version,
            vendor: data.vendor,
            repo_name: data.repo_name,
            stability: data.stability,
            sdesc: data.sdesc,
            ldesc: data.ldesc,
            depends: data.depends,
            archive: data.archive,
            source: data.source,
            accessible,
            source_accessible,
        }
    }

    /// Whether the binary archive is cached locally or fetchable from a mirror.
    pub fn accessible(&self) -> bool {
        self.accessible
    }

    /// Whether the source archive is cached locally or fetchable from a mirror.
    pub fn source_accessible(&self) -> bool {
        self.source_accessible
    }

    pub fn has_binary(&self) -> bool {
        !self.archive.is_empty()
    }

    pub fn is_installed_entry(&self) -> bool {
        self.repo_name == INSTALLED_REPO
    }
}

/// The solver-side store of versions.
pub trait VersionRegistry {
    /// Mint a new version for package `name`.
    fn add_package(&mut self, name: &str, data: PackageData) -> VersionId;

    /// Retire a version. Its handle stays invalid forever.
    fn remove(&mut self, id: VersionId);

    fn get(&self, id: VersionId) -> Option<&PackageVersion>;

    /// Total order over versions of the same package.
    fn compare(&self, a: VersionId, b: VersionId) -> Ordering;

    fn is_test_package(&self, id: VersionId) -> bool;

    /// Record the outcome of a cache scan.
    fn set_accessibility(&mut self, id: VersionId, binary: bool, source: bool);

    fn canonical_version(&self, id: VersionId) -> &str {
        self.get(id).map_or("", |v| v.canonical_version.as_str())
    }

    fn is_accessible(&self, id: VersionId) -> bool {
        self.get(id).is_some_and(PackageVersion::accessible)
    }
}
