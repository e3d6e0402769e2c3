use anyhow::{Result, bail};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use super::{Action, ActionId, CategoryIndex, PackageEvent, PackageMeta, Script, Task};
use crate::cache::{self, CacheIndex, PrunedVersion};
use crate::registry::{INSTALLED_REPO, PackageData, Trust, VersionId, VersionPool, VersionRegistry};
use crate::selection::SelectionContext;

/// Outcome of [`PackageDb::scan_downloaded_files`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub pruned: Vec<PrunedVersion>,
    /// Packages left without any version, and removed
    pub dropped: Vec<String>,
}

/// The package database of one run: every package by name, the versions
/// they refer to, and the category index.
#[derive(Debug, Default)]
pub struct PackageDb {
    pool: VersionPool,
    packages: BTreeMap<String, PackageMeta>,
    categories: CategoryIndex,
    task: Task,
    blacklists: BTreeMap<String, BTreeSet<String>>,
}

impl PackageDb {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            ..Default::default()
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn registry(&self) -> &VersionPool {
        &self.pool
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageMeta> {
        self.packages.values()
    }

    pub fn package(&self, name: &str) -> Option<&PackageMeta> {
        self.packages.get(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn lookup_mut(&mut self, name: &str) -> Result<(&VersionPool, &mut PackageMeta)> {
        match self.packages.get_mut(name) {
            Some(meta) => Ok((&self.pool, meta)),
            None => bail!("Unknown package: {}", name),
        }
    }

    /// Add a version of package `name`, creating the package on first sight.
    ///
    /// Returns `None` when the version is blacklisted.
    pub fn add_version(&mut self, name: &str, data: PackageData) -> Option<VersionId> {
        if self
            .blacklists
            .get(name)
            .is_some_and(|blacklist| blacklist.contains(&data.version))
        {
            debug!("Skipping blacklisted version {} of {}", data.version, name);
            return None;
        }

        let blacklists = &self.blacklists;
        let meta = self
            .packages
            .entry(name.to_string())
            .or_insert_with(|| new_meta(name, blacklists));
        meta.add_version(&mut self.pool, data)
    }

    /// Record `version` of `name` as installed.
    ///
    /// The entry takes the vendor of a repository version with the same
    /// canonical string, so it merges with it. Blacklists do not apply.
    pub fn add_installed(&mut self, name: &str, version: &str) -> Option<VersionId> {
        let vendor = self
            .packages
            .get(name)
            .and_then(|meta| meta.versions().find_canonical(&self.pool, version))
            .and_then(|id| self.pool.get(id))
            .map(|v| v.vendor.clone())
            .unwrap_or_default();

        let data = PackageData {
            version: version.to_string(),
            vendor,
            repo_name: INSTALLED_REPO.to_string(),
            ..Default::default()
        };
        let blacklists = &self.blacklists;
        let meta = self
            .packages
            .entry(name.to_string())
            .or_insert_with(|| new_meta(name, blacklists));
        let id = meta.add_version(&mut self.pool, data);
        meta.set_installed_version(&self.pool, version);
        id
    }

    /// Versions of `name` that must never be offered.
    pub fn set_version_blacklist(&mut self, name: &str, blacklist: BTreeSet<String>) {
        if let Some(meta) = self.packages.get_mut(name) {
            meta.set_version_blacklist(blacklist.clone());
        }
        self.blacklists.insert(name.to_string(), blacklist);
    }

    pub fn set_installed_version(&mut self, name: &str, version: &str) -> bool {
        match self.packages.get_mut(name) {
            Some(meta) => meta.set_installed_version(&self.pool, version),
            None => false,
        }
    }

    pub fn add_category(&mut self, name: &str, category: &str) -> bool {
        match self.packages.get_mut(name) {
            Some(meta) => {
                meta.add_category(&mut self.categories, category);
                true
            }
            None => false,
        }
    }

    pub fn add_script(&mut self, name: &str, script: Script) -> bool {
        match self.packages.get_mut(name) {
            Some(meta) => {
                meta.add_script(script);
                true
            }
            None => false,
        }
    }

    pub fn set_message(&mut self, name: &str, id: &str, text: &str) -> bool {
        match self.packages.get_mut(name) {
            Some(meta) => {
                meta.set_message(id, text);
                true
            }
            None => false,
        }
    }

    /// Put uncategorised packages in Orphaned, and every package in All.
    pub fn finalize_categories(&mut self) {
        for meta in self.packages.values_mut() {
            if meta.has_no_categories() {
                meta.set_default_categories(&mut self.categories);
            }
            meta.add_to_category_all(&mut self.categories);
        }
    }

    /// Remove a package along with its category memberships and versions.
    pub fn remove_package(&mut self, name: &str) -> Option<PackageMeta> {
        let mut meta = self.packages.remove(name)?;
        meta.retract_categories(&mut self.categories);
        let ids: Vec<VersionId> = meta.versions().iter().collect();
        for id in ids {
            meta.forget_version(id);
            self.pool.remove(id);
        }
        Some(meta)
    }

    pub fn set_action(
        &mut self,
        name: &str,
        action: Action,
        default_version: Option<VersionId>,
        user_action: bool,
    ) -> Result<Vec<PackageEvent>> {
        let (pool, meta) = self.lookup_mut(name)?;
        Ok(meta.set_action(pool, action, default_version, user_action))
    }

    pub fn select_action(
        &mut self,
        name: &str,
        id: ActionId,
        default_trust: Trust,
    ) -> Result<Vec<PackageEvent>> {
        let (pool, meta) = self.lookup_mut(name)?;
        meta.select_action(pool, id, default_trust)
    }

    pub fn toggle_action(&mut self, name: &str) -> Result<Vec<PackageEvent>> {
        let (pool, meta) = self.lookup_mut(name)?;
        Ok(meta.toggle_action(pool))
    }

    /// Choose an action for every package from the command-line selection.
    #[tracing::instrument(skip_all, fields(trust = %trust))]
    pub fn apply_selection(
        &mut self,
        selection: &SelectionContext,
        trust: Trust,
    ) -> Vec<PackageEvent> {
        let pool = &self.pool;
        let mut events = Vec::new();

        for meta in self.packages.values_mut() {
            let name = meta.name().to_string();
            let deleted = selection.is_manually_deleted(&name, meta.categories());
            let wanted = !deleted && selection.is_manually_wanted(&name, meta.categories());

            let produced = if deleted {
                if meta.installed().is_some() {
                    meta.set_action(pool, Action::Uninstall, None, true)
                } else {
                    meta.set_action(pool, Action::NoChange, None, false)
                }
            } else if wanted {
                let version = meta.trustp(pool, true, trust);
                meta.set_action(pool, Action::Install, version, true)
            } else {
                let version = meta.trustp(pool, true, trust);
                meta.set_action(pool, Action::NoChange, version, false)
            };
            events.extend(produced);
        }

        events
    }

    /// Prune unreachable versions, then drop packages left with none.
    pub fn scan_downloaded_files<C: CacheIndex + ?Sized>(
        &mut self,
        cache: &C,
        mirror_mode: bool,
    ) -> Result<ScanReport> {
        let pruned = cache::scan_downloaded_files(
            self.packages.values_mut(),
            &mut self.pool,
            cache,
            mirror_mode,
        )?;

        let empty: Vec<String> = self
            .packages
            .values()
            .filter(|meta| meta.versions().is_empty())
            .map(|meta| meta.name().to_string())
            .collect();
        for name in &empty {
            info!("Dropping package {}: no version is available", name);
            self.remove_package(name);
        }

        Ok(ScanReport {
            pruned,
            dropped: empty,
        })
    }

    pub fn log_selection_status(&self) {
        for meta in self.packages.values() {
            meta.log_selection_status(&self.pool, self.task);
        }
    }
}

fn new_meta(name: &str, blacklists: &BTreeMap<String, BTreeSet<String>>) -> PackageMeta {
    let mut meta = PackageMeta::new(name);
    if let Some(blacklist) = blacklists.get(name) {
        meta.set_version_blacklist(blacklist.clone());
    }
    meta
}
