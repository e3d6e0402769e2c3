//! What to do with a package: keep, install, reinstall or uninstall.
//!
//! Transitions never display anything themselves. Each returns the
//! [`PackageEvent`]s it produced, for the caller to dispatch.

use anyhow::{Context, Result};
use log::warn;

use super::category::{BASE_CATEGORY, ORPHANED_CATEGORY};
use super::{PackageEvent, PackageMeta};
use crate::registry::{Trust, VersionId, VersionRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// Keep if installed, skip if not
    #[default]
    NoChange,
    Install,
    Reinstall,
    Uninstall,
}

impl Action {
    pub fn caption(self) -> &'static str {
        match self {
            Action::NoChange => "Default",
            Action::Install => "Install",
            Action::Reinstall => "Reinstall",
            Action::Uninstall => "Uninstall",
        }
    }
}

/// What the current run does with picked packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Task {
    #[default]
    Install,
    /// Fetch archives only
    Download,
}

impl Task {
    fn reinstall_label(self) -> &'static str {
        match self {
            Task::Install => "Reinstall",
            Task::Download => "Retrieve",
        }
    }
}

/// Identifies an entry of [`PackageMeta::list_actions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    /// Install the version at this ascending position in the version set
    Ordinal(usize),
    Named(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    pub label: String,
    pub id: ActionId,
    pub selected: bool,
    pub enabled: bool,
}

impl ActionItem {
    fn new(label: impl Into<String>, id: ActionId, selected: bool, enabled: bool) -> Self {
        Self {
            label: label.into(),
            id,
            selected,
            enabled,
        }
    }
}

impl PackageMeta {
    /// Set `action`, targeting `default_version` where the action takes one.
    ///
    /// Actions that cannot be carried out degrade to [`Action::NoChange`]:
    /// installing nothing, installing what is already installed, or
    /// reinstalling a package that is not installed.
    #[tracing::instrument(skip(self, registry), fields(package = %self.name))]
    pub fn set_action<R: VersionRegistry>(
        &mut self,
        registry: &R,
        action: Action,
        default_version: Option<VersionId>,
        user_action: bool,
    ) -> Vec<PackageEvent> {
        let default_version = default_version.filter(|&id| {
            let known = self.versions.contains(id);
            if !known {
                warn!("Ignoring version {:?} not offered for package {}", id, self.name);
            }
            known
        });

        let mut events = Vec::new();
        let mut action = action;

        match action {
            Action::NoChange => {
                if self.installed.is_some()
                    || self.has_category(BASE_CATEGORY)
                    || self.has_category(ORPHANED_CATEGORY)
                {
                    self.desired = default_version;
                    if self.desired.is_some() {
                        self.pick(self.desired != self.installed, &mut events);
                        self.src_picked = false;
                    }
                } else {
                    self.desired = None;
                    self.pick(false, &mut events);
                }
            }
            Action::Install => {
                self.desired = default_version;
                match self.desired {
                    Some(desired) if self.installed != Some(desired) => {
                        if registry.is_accessible(desired) {
                            if user_action {
                                self.user_picked = true;
                            }
                            self.pick(true, &mut events);
                            self.src_picked = false;
                        } else {
                            self.pick(false, &mut events);
                            self.src_picked = true;
                        }
                    }
                    _ => {
                        action = Action::NoChange;
                        self.pick(false, &mut events);
                        self.src_picked = false;
                    }
                }
            }
            Action::Reinstall => {
                self.desired = self.installed;
                if self.desired.is_some() {
                    self.pick(true, &mut events);
                    self.src_picked = false;
                } else {
                    action = Action::NoChange;
                    self.pick(false, &mut events);
                    self.src_picked = false;
                }
            }
            Action::Uninstall => {
                self.desired = None;
            }
        }

        self.action = action;
        events
    }

    fn pick(&mut self, picked: bool, events: &mut Vec<PackageEvent>) {
        self.picked = picked;
        if picked && let Some(message) = &self.message {
            events.push(PackageEvent::ShowMessage {
                package: self.name.clone(),
                message: message.clone(),
            });
        }
    }

    /// Apply an entry chosen from [`list_actions`](Self::list_actions).
    pub fn select_action<R: VersionRegistry>(
        &mut self,
        registry: &R,
        id: ActionId,
        default_trust: Trust,
    ) -> Result<Vec<PackageEvent>> {
        match id {
            ActionId::Ordinal(index) => {
                let version = self.versions.get(index).with_context(|| {
                    format!("Package {} has no version at position {}", self.name, index)
                })?;
                Ok(self.set_action(registry, Action::Install, Some(version), true))
            }
            ActionId::Named(Action::NoChange) => {
                Ok(self.set_action(registry, Action::NoChange, self.installed, false))
            }
            ActionId::Named(action) => {
                let default_version = self.trustp(registry, true, default_trust);
                Ok(self.set_action(registry, action, default_version, true))
            }
        }
    }

    /// Flip between the installed state and the highest non-test version.
    pub fn toggle_action<R: VersionRegistry>(&mut self, registry: &R) -> Vec<PackageEvent> {
        if self.desired != self.installed {
            self.set_action(registry, Action::NoChange, self.installed, false)
        } else {
            let naively_preferred = self
                .versions
                .iter()
                .filter(|&id| !registry.is_test_package(id))
                .last();
            self.set_action(registry, Action::Install, naively_preferred, true)
        }
    }

    /// The choices a user can make for this package, in display order.
    pub fn list_actions<'a, R: VersionRegistry>(
        &'a self,
        registry: &'a R,
        task: Task,
    ) -> impl Iterator<Item = ActionItem> + 'a {
        let installed = self.installed.is_some();
        let action = self.action;

        let fixed = [
            ActionItem::new(
                "Uninstall",
                ActionId::Named(Action::Uninstall),
                action == Action::Uninstall,
                installed,
            ),
            ActionItem::new(
                "Skip",
                ActionId::Named(Action::NoChange),
                action == Action::NoChange && !installed,
                !installed,
            ),
        ];

        let per_version = self
            .versions
            .iter()
            .enumerate()
            .flat_map(move |(index, id)| {
                if self.installed == Some(id) {
                    vec![
                        ActionItem::new(
                            "Keep",
                            ActionId::Named(Action::NoChange),
                            action == Action::NoChange,
                            true,
                        ),
                        ActionItem::new(
                            task.reinstall_label(),
                            ActionId::Named(Action::Reinstall),
                            action == Action::Reinstall,
                            true,
                        ),
                    ]
                } else {
                    let mut label = registry.canonical_version(id).to_string();
                    if registry.is_test_package(id) {
                        label.push_str(" (Test)");
                    }
                    vec![ActionItem::new(
                        label,
                        ActionId::Ordinal(index),
                        action == Action::Install && self.desired == Some(id),
                        true,
                    )]
                }
            });

        fixed.into_iter().chain(per_version)
    }

    /// Short description of the current action.
    pub fn action_caption<R: VersionRegistry>(&self, registry: &R, task: Task) -> String {
        match self.action {
            Action::Uninstall => "Uninstall".to_string(),
            Action::NoChange => match self.desired {
                None => "Skip".to_string(),
                Some(id)
                    if self.src_picked
                        && registry.get(id).is_some_and(|v| v.source.is_some()) =>
                {
                    "Source".to_string()
                }
                Some(_) => "Keep".to_string(),
            },
            Action::Reinstall => task.reinstall_label().to_string(),
            Action::Install => self
                .desired
                .map(|id| registry.canonical_version(id).to_string())
                .unwrap_or_default(),
        }
    }
}
