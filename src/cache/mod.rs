//! Local package cache.
//!
//! Answers whether a version's archives are reachable, either because they sit
//! in the local package directory or because a mirror can serve them, and
//! prunes versions that are not.

mod scanner;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::registry::Archive;
use crate::runtime::Runtime;

pub use scanner::{PrunedVersion, scan_downloaded_files};

#[derive(Debug, Error)]
pub enum CacheError {
    /// The cached file exists but does not match its metadata.
    #[error("cached archive {path:?} is corrupt")]
    CorruptArtifact { path: PathBuf },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Where archives come from in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Archives may be downloaded from their mirror sites
    #[default]
    Internet,
    /// Only the local package directory is used
    LocalDir,
}

#[cfg_attr(test, mockall::automock)]
pub trait CacheIndex {
    /// Is `archive` cached locally or fetchable?
    ///
    /// A `lazy` check trusts any cached file without verifying it.
    fn is_accessible(&self, archive: &Archive, lazy: bool) -> Result<bool, CacheError>;
}

/// [`CacheIndex`] over a local package directory laid out like the mirrors.
pub struct LocalCache<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
    mode: SourceMode,
}

impl<'a, R: Runtime> LocalCache<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<PathBuf>, mode: SourceMode) -> Self {
        Self {
            runtime,
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }
}

impl<R: Runtime> CacheIndex for LocalCache<'_, R> {
    #[tracing::instrument(skip(self))]
    fn is_accessible(&self, archive: &Archive, lazy: bool) -> Result<bool, CacheError> {
        if archive.is_empty() {
            return Ok(false);
        }

        let path = self.root.join(&archive.path);
        if self.runtime.exists(&path) {
            if !lazy && archive.size > 0 {
                let size = self.runtime.file_size(&path)?;
                if size != archive.size {
                    return Err(CacheError::CorruptArtifact { path });
                }
            }
            return Ok(true);
        }

        Ok(self.mode == SourceMode::Internet && !archive.sites.is_empty())
    }
}
