use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;

use crate::{
    cache::{LocalCache, SourceMode},
    catalog::Catalog,
    package::{PackageDb, Task},
    registry::Trust,
    runtime::Runtime,
};

pub const LOCAL_DIR_ENV: &str = "PKGMETA_LOCAL_DIR";
pub const CATALOG_FILE: &str = "catalog.json";

/// Global options as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub catalog: Option<PathBuf>,
    pub local_dir: Option<PathBuf>,
    pub download_only: bool,
    pub local_install: bool,
    pub trust: Trust,
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub catalog: PathBuf,
    pub local_dir: PathBuf,
    pub task: Task,
    pub source_mode: SourceMode,
    pub trust: Trust,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: Options) -> Result<Self> {
        let local_dir = match options.local_dir {
            Some(path) => path,
            None => default_local_dir(&runtime)?,
        };
        info!("Using local package directory: {}", local_dir.display());

        let catalog = options
            .catalog
            .unwrap_or_else(|| local_dir.join(CATALOG_FILE));
        debug!("Using catalog: {}", catalog.display());

        let task = if options.download_only {
            Task::Download
        } else {
            Task::Install
        };
        let source_mode = if options.local_install {
            SourceMode::LocalDir
        } else {
            SourceMode::Internet
        };

        Ok(Self {
            runtime,
            catalog,
            local_dir,
            task,
            source_mode,
            trust: options.trust,
        })
    }

    /// Build the package database from the catalog.
    pub fn load_db(&self) -> Result<PackageDb> {
        let catalog = Catalog::load(&self.runtime, &self.catalog)?;
        let mut db = PackageDb::new(self.task);
        catalog.populate(&mut db);
        debug!("Loaded {} packages", db.len());
        Ok(db)
    }

    pub fn cache(&self) -> LocalCache<'_, R> {
        LocalCache::new(&self.runtime, self.local_dir.clone(), self.source_mode)
    }
}

/// `$PKGMETA_LOCAL_DIR`, else `pkgmeta` under the user's cache directory.
#[tracing::instrument(skip(runtime))]
pub fn default_local_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Ok(dir) = runtime.env_var(LOCAL_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let cache_dir = runtime
        .cache_dir()
        .context("Could not find a cache directory")?;
    Ok(cache_dir.join("pkgmeta"))
}
