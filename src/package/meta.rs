use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::{Action, PackageMessage, Script, Task, VersionSet};
use crate::registry::{
    INSTALLED_REPO, PackageData, PackageVersion, Trust, VersionId, VersionRegistry,
};

/// Everything known about one package name: its available versions, which of
/// them are installed, stable, experimental or wanted, and what to do with it.
///
/// The version slots (`curr`, `exp`, `installed`, `desired`) are handles that
/// always point into `versions` or are empty.
#[derive(Debug, Clone)]
pub struct PackageMeta {
    pub(super) name: String,
    pub(super) versions: VersionSet,
    pub(super) curr: Option<VersionId>,
    pub(super) exp: Option<VersionId>,
    pub(super) installed: Option<VersionId>,
    pub(super) desired: Option<VersionId>,
    pub(super) action: Action,
    pub(super) picked: bool,
    pub(super) src_picked: bool,
    pub(super) user_picked: bool,
    /// lowercased name -> name as first spelled
    pub(super) categories: BTreeMap<String, String>,
    pub(super) version_blacklist: BTreeSet<String>,
    pub(super) scripts: Vec<Script>,
    pub(super) message: Option<PackageMessage>,
}

impl PackageMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: VersionSet::new(),
            curr: None,
            exp: None,
            installed: None,
            desired: None,
            action: Action::NoChange,
            picked: false,
            src_picked: false,
            user_picked: false,
            categories: BTreeMap::new(),
            version_blacklist: BTreeSet::new(),
            scripts: Vec::new(),
            message: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> &VersionSet {
        &self.versions
    }

    /// Best stable version.
    pub fn curr(&self) -> Option<VersionId> {
        self.curr
    }

    /// Best experimental version.
    pub fn exp(&self) -> Option<VersionId> {
        self.exp
    }

    pub fn installed(&self) -> Option<VersionId> {
        self.installed
    }

    pub fn desired(&self) -> Option<VersionId> {
        self.desired
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// True if the desired version is to be (re)installed.
    pub fn picked(&self) -> bool {
        self.picked
    }

    /// True if the source of the desired version is to be fetched.
    pub fn src_picked(&self) -> bool {
        self.src_picked
    }

    /// True once a user explicitly chose to install this package.
    pub fn user_picked(&self) -> bool {
        self.user_picked
    }

    /// Add a version from a repository or the installed database.
    ///
    /// An existing entry with the same canonical version is replaced: the last
    /// one added wins. Loaders add installed-database entries last, so the
    /// installed record becomes the entry for its version while keeping the
    /// sites of the repository entry it replaced.
    ///
    /// Returns `None` if the version set rejects the new handle.
    #[tracing::instrument(skip(self, registry, data), fields(package = %self.name, version = %data.version))]
    pub fn add_version<R: VersionRegistry>(
        &mut self,
        registry: &mut R,
        mut data: PackageData,
    ) -> Option<VersionId> {
        let installed_entry = data.repo_name == INSTALLED_REPO;
        let replaced = self.versions.find_canonical(registry, &data.version);

        if let Some(old) = replaced {
            let previous = registry.get(old).cloned();
            let old_vendor = previous.as_ref().map_or("", |v| v.vendor.as_str());

            if old_vendor == data.vendor {
                if let Some(previous) = &previous {
                    merge_previous(&mut data, previous);
                }

                // Installed records never supersede repository entries
                if !installed_entry {
                    if self.curr == Some(old) {
                        self.curr = None;
                    }
                    if self.exp == Some(old) {
                        self.exp = None;
                    }
                    registry.remove(old);
                }
            } else if !installed_entry {
                info!(
                    "Version {} of package {} is present in releases labelled {} and {}",
                    data.version, self.name, data.vendor, old_vendor
                );
            }

            self.versions.remove(old);
        }

        let stability = data.stability;
        let id = registry.add_package(&self.name, data);
        let inserted = self.versions.insert(registry, id);

        if inserted {
            debug!(
                "Added version {} in package {}",
                registry.canonical_version(id),
                self.name
            );
        } else {
            warn!(
                "Failed to add version {} in package {}",
                registry.canonical_version(id),
                self.name
            );
        }

        if let Some(old) = replaced {
            self.retarget(old, inserted.then_some(id));
        }

        if !inserted {
            // a recycled handle may still belong to a member
            if !self.versions.contains(id) {
                registry.remove(id);
            }
            return None;
        }

        if let Some(trust) = stability {
            let slot = match trust {
                Trust::Curr => &mut self.curr,
                Trust::Test => &mut self.exp,
            };
            // any version beats no version; ties go to the newest
            let wins = slot.is_none_or(|current| registry.compare(id, current) != Ordering::Less);
            if wins {
                *slot = Some(id);
            }
        }

        Some(id)
    }

    /// Point every slot holding `old` at `new` instead.
    fn retarget(&mut self, old: VersionId, new: Option<VersionId>) {
        for slot in [
            &mut self.curr,
            &mut self.exp,
            &mut self.installed,
            &mut self.desired,
        ] {
            if *slot == Some(old) {
                *slot = new;
            }
        }
    }

    /// Drop `id` from the version set, clearing every slot that referenced it.
    /// The caller is responsible for retiring it in the registry.
    ///
    /// Losing the desired version leaves nothing to transfer: an install or
    /// reinstall degrades to [`Action::NoChange`] with both picks cleared.
    pub(crate) fn forget_version(&mut self, id: VersionId) -> bool {
        if !self.versions.remove(id) {
            return false;
        }
        let was_desired = self.desired == Some(id);
        self.retarget(id, None);

        if was_desired {
            if matches!(self.action, Action::Install | Action::Reinstall) {
                debug!("Version wanted for {} is gone, keeping it unchanged", self.name);
                self.action = Action::NoChange;
            }
            self.picked = false;
            self.src_picked = false;
        }
        true
    }

    /// Mark the version with canonical string `version` as installed, and keep it.
    pub fn set_installed_version<R: VersionRegistry>(&mut self, registry: &R, version: &str) -> bool {
        match self.versions.find_canonical(registry, version) {
            Some(id) => {
                self.installed = Some(id);
                self.desired = Some(id);
                true
            }
            None => false,
        }
    }

    /// The version to offer by default for trust preference `trust`.
    ///
    /// When `default` is set and the user already runs something newer than
    /// the stable release, they are never pulled back to it: a newer test
    /// version is offered if there is one, else the installed version.
    pub fn trustp<R: VersionRegistry>(
        &self,
        registry: &R,
        default: bool,
        trust: Trust,
    ) -> Option<VersionId> {
        if trust == Trust::Test
            && let Some(exp) = self.exp
        {
            return Some(exp);
        }

        if default
            && let (Some(curr), Some(installed)) = (self.curr, self.installed)
            && registry.compare(curr, installed) == Ordering::Less
        {
            if let Some(exp) = self.exp
                && registry.compare(installed, exp) == Ordering::Less
            {
                return Some(exp);
            }
            return Some(installed);
        }

        self.curr.or(self.installed)
    }

    pub fn trust_label(&self, id: VersionId) -> &'static str {
        if self.curr == Some(id) {
            Trust::Curr.label()
        } else if self.exp == Some(id) {
            Trust::Test.label()
        } else {
            "Unknown"
        }
    }

    pub fn set_version_blacklist(&mut self, blacklist: BTreeSet<String>) {
        self.version_blacklist = blacklist;
    }

    pub fn is_blacklisted(&self, version: &str) -> bool {
        self.version_blacklist.contains(version)
    }

    pub fn is_version_blacklisted<R: VersionRegistry>(&self, registry: &R, id: VersionId) -> bool {
        self.is_blacklisted(registry.canonical_version(id))
    }

    pub fn set_message(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.message = Some(PackageMessage::new(id, text));
    }

    pub fn message(&self) -> Option<&PackageMessage> {
        self.message.as_ref()
    }

    pub fn add_script(&mut self, script: Script) {
        self.scripts.push(script);
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    /// Short description of the first version that has one.
    pub fn sdesc<'r, R: VersionRegistry>(&self, registry: &'r R) -> &'r str {
        self.versions
            .iter()
            .filter_map(|id| registry.get(id))
            .map(|v| v.sdesc.as_str())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Long description of the first version that has one.
    pub fn ldesc<'r, R: VersionRegistry>(&self, registry: &'r R) -> &'r str {
        self.versions
            .iter()
            .filter_map(|id| registry.get(id))
            .map(|v| v.ldesc.as_str())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Can any version be installed?
    pub fn accessible<R: VersionRegistry>(&self, registry: &R) -> bool {
        self.versions.iter().any(|id| registry.is_accessible(id))
    }

    /// Can the source of any version be fetched?
    pub fn source_accessible<R: VersionRegistry>(&self, registry: &R) -> bool {
        self.versions
            .iter()
            .filter_map(|id| registry.get(id))
            .any(|v| v.source_accessible())
    }

    pub fn is_binary<R: VersionRegistry>(&self, registry: &R) -> bool {
        self.versions.iter().any(|id| {
            registry.get(id).is_some_and(|v| {
                v.has_binary() && (v.accessible() || self.installed == Some(id))
            })
        })
    }

    pub fn log_selection_status<R: VersionRegistry>(&self, registry: &R, task: Task) {
        let trust = match self.desired {
            Some(id) if self.curr == Some(id) => "curr",
            Some(id) if self.exp == Some(id) => "test",
            _ => "unknown",
        };
        let installed = self
            .installed
            .map_or("none", |id| registry.canonical_version(id));

        debug!(
            "[{}] action={} trust={} installed={} src?={}",
            self.name,
            self.action_caption(registry, task),
            trust,
            installed,
            if self.desired.is_some() && self.src_picked { "yes" } else { "no" }
        );
        if !self.categories.is_empty() {
            debug!(
                "     categories={}",
                self.categories().collect::<Vec<_>>().join(", ")
            );
        }
        self.log_all_versions(registry);
    }

    pub fn log_all_versions<R: VersionRegistry>(&self, registry: &R) {
        for id in self.versions.iter() {
            debug!(
                "    [{}] ver={}",
                self.trust_label(id),
                registry.canonical_version(id)
            );
            if let Some(version) = registry.get(id) {
                debug!("      depends={}", version.depends.join(", "));
            }
        }
    }
}

/// Carry over what the replaced entry knew and the incoming one does not.
fn merge_previous(data: &mut PackageData, previous: &PackageVersion) {
    for site in &previous.archive.sites {
        if !data.archive.sites.contains(site) {
            data.archive.sites.push(site.clone());
        }
    }
    if data.archive.is_empty() {
        data.archive.path = previous.archive.path.clone();
        data.archive.size = previous.archive.size;
    }
    if data.source.is_none() {
        data.source = previous.source.clone();
    }
    if data.sdesc.is_empty() {
        data.sdesc = previous.sdesc.clone();
    }
    if data.ldesc.is_empty() {
        data.ldesc = previous.ldesc.clone();
    }
}
