use anyhow::Result;
use log::{debug, warn};

use super::{CacheError, CacheIndex};
use crate::package::PackageMeta;
use crate::registry::{Archive, VersionId, VersionRegistry};

/// A version dropped because it can be neither installed nor built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedVersion {
    pub package: String,
    pub version: String,
}

/// Check every version of every package against the cache.
///
/// Versions whose binary and source are both unreachable are removed from
/// their package and retired in the registry, unless they are installed. The
/// rest get their accessibility flags refreshed. A corrupt cached file counts
/// as unreachable; any other cache failure aborts the pass.
///
/// In `mirror_mode` cached files are trusted without verification, except for
/// an installed version that is neither the stable nor the test release.
#[tracing::instrument(skip(packages, registry, cache))]
pub fn scan_downloaded_files<'a, R, C>(
    packages: impl IntoIterator<Item = &'a mut PackageMeta>,
    registry: &mut R,
    cache: &C,
    mirror_mode: bool,
) -> Result<Vec<PrunedVersion>>
where
    R: VersionRegistry,
    C: CacheIndex + ?Sized,
{
    let mut pruned = Vec::new();

    for pkg in packages {
        let ids: Vec<VersionId> = pkg.versions().iter().collect();
        for id in ids {
            let installed = pkg.installed();
            let lazy = mirror_mode
                && (installed != Some(id) || installed == pkg.curr() || installed == pkg.exp());

            let Some(version) = registry.get(id) else {
                continue;
            };
            let binary = check(cache, &version.archive, lazy)?;
            let source = match &version.source {
                Some(source) => check(cache, source, lazy)?,
                None => false,
            };

            if !binary && !source && installed != Some(id) {
                let version = registry.canonical_version(id).to_string();
                debug!("Removing inaccessible version {} of {}", version, pkg.name());
                pkg.forget_version(id);
                registry.remove(id);
                pruned.push(PrunedVersion {
                    package: pkg.name().to_string(),
                    version,
                });
            } else {
                registry.set_accessibility(id, binary, source);
            }
        }
    }

    Ok(pruned)
}

fn check<C: CacheIndex + ?Sized>(cache: &C, archive: &Archive, lazy: bool) -> Result<bool> {
    if archive.is_empty() {
        return Ok(false);
    }

    match cache.is_accessible(archive, lazy) {
        Ok(accessible) => Ok(accessible),
        Err(CacheError::CorruptArtifact { path }) => {
            warn!("Ignoring corrupt cached archive {:?}", path);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
