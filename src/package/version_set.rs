use std::cmp::Ordering;

use crate::registry::{VersionId, VersionRegistry};

/// Versions of one package, kept in ascending registry order and unique by
/// canonical version string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet {
    ids: Vec<VersionId>,
}

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate in ascending version order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = VersionId> + '_ {
        self.ids.iter().copied()
    }

    pub fn contains(&self, id: VersionId) -> bool {
        self.ids.contains(&id)
    }

    /// Version at zero-based ascending position `index`.
    pub fn get(&self, index: usize) -> Option<VersionId> {
        self.ids.get(index).copied()
    }

    pub fn position(&self, id: VersionId) -> Option<usize> {
        self.ids.iter().position(|&v| v == id)
    }

    pub fn find_canonical<R: VersionRegistry>(&self, registry: &R, version: &str) -> Option<VersionId> {
        self.iter()
            .find(|&id| registry.canonical_version(id) == version)
    }

    /// Insert keeping ascending order. Returns false, leaving the set
    /// untouched, if a member already has the same canonical version.
    pub fn insert<R: VersionRegistry>(&mut self, registry: &R, id: VersionId) -> bool {
        if self.contains(id)
            || self
                .find_canonical(registry, registry.canonical_version(id))
                .is_some()
        {
            return false;
        }

        // equal-ordering versions ("1.1" vs "1.01") go after existing ones
        let at = self
            .ids
            .partition_point(|&existing| registry.compare(existing, id) != Ordering::Greater);
        self.ids.insert(at, id);
        true
    }

    pub fn remove(&mut self, id: VersionId) -> bool {
        match self.position(id) {
            Some(at) => {
                self.ids.remove(at);
                true
            }
            None => false,
        }
    }
}
