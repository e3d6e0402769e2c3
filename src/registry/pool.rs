use log::debug;
use std::cmp::Ordering;

use super::{PackageData, PackageVersion, Trust, VersionId, VersionRegistry, compare_versions};

/// Arena-backed [`VersionRegistry`].
///
/// Slots are never reused: removing a version leaves a hole so that every
/// outstanding [`VersionId`] either resolves to the version it was minted for
/// or to nothing.
#[derive(Debug, Default)]
pub struct VersionPool {
    slots: Vec<Option<PackageVersion>>,
    live: usize,
}

impl VersionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: VersionId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live versions.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl VersionRegistry for VersionPool {
    fn add_package(&mut self, name: &str, data: PackageData) -> VersionId {
        let id = VersionId(self.slots.len());
        self.slots.push(Some(PackageVersion::new(name, data)));
        self.live += 1;
        id
    }

    fn remove(&mut self, id: VersionId) {
        if let Some(slot) = self.slots.get_mut(id.0)
            && let Some(version) = slot.take()
        {
            debug!(
                "Removed version {} of package {} from the pool",
                version.canonical_version, version.name
            );
            self.live -= 1;
        }
    }

    fn get(&self, id: VersionId) -> Option<&PackageVersion> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn compare(&self, a: VersionId, b: VersionId) -> Ordering {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => compare_versions(&a.canonical_version, &b.canonical_version),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }

    fn is_test_package(&self, id: VersionId) -> bool {
        self.get(id)
            .is_some_and(|v| v.stability == Some(Trust::Test))
    }

    fn set_accessibility(&mut self, id: VersionId, binary: bool, source: bool) {
        if let Some(Some(version)) = self.slots.get_mut(id.0) {
            version.accessible = binary;
            version.source_accessible = source;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(version: &str, stability: Option<Trust>) -> PackageData {
        PackageData {
            version: version.into(),
            vendor: "release-a".into(),
            repo_name: "main".into(),
            stability,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut pool = VersionPool::new();
        let a = pool.add_package("foo", data("1.0", None));
        let b = pool.add_package("foo", data("2.0", None));
        assert_eq!(pool.len(), 2);
        assert_ne!(a, b);

        pool.remove(a);
        assert!(!pool.contains(a));
        assert!(pool.contains(b));
        assert_eq!(pool.len(), 1);

        // removing twice is harmless
        pool.remove(a);
        assert_eq!(pool.len(), 1);

        // handles are never recycled
        let c = pool.add_package("foo", data("3.0", None));
        assert_ne!(a, c);
        assert!(!pool.contains(a));
    }

    #[test]
    fn test_compare_and_classify() {
        let mut pool = VersionPool::new();
        let old = pool.add_package("foo", data("1.9", Some(Trust::Curr)));
        let new = pool.add_package("foo", data("1.10", Some(Trust::Test)));

        assert_eq!(pool.compare(old, new), Ordering::Less);
        assert_eq!(pool.compare(new, old), Ordering::Greater);
        assert!(!pool.is_test_package(old));
        assert!(pool.is_test_package(new));
        assert_eq!(pool.canonical_version(new), "1.10");

        pool.remove(old);
        assert_eq!(pool.compare(new, old), Ordering::Greater);
        assert_eq!(pool.canonical_version(old), "");
    }

    #[test]
    fn test_set_accessibility() {
        let mut pool = VersionPool::new();
        let id = pool.add_package("foo", data("1.0", None));
        assert!(!pool.is_accessible(id));

        pool.set_accessibility(id, true, false);
        assert!(pool.is_accessible(id));
        assert!(!pool.get(id).unwrap().source_accessible());
    }
}
