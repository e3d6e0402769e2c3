//! Category membership, kept consistent in both directions.
//!
//! A package records the categories it is in; the [`CategoryIndex`] records
//! the packages in each category. Both sides compare names case-insensitively.

use std::collections::BTreeMap;

use super::PackageMeta;

/// Packages here are kept (or installed) even when not installed before.
pub const BASE_CATEGORY: &str = "Base";
/// Assigned to packages no repository put in any category.
pub const ORPHANED_CATEGORY: &str = "Orphaned";
/// Every package is in it; omitted from readable listings.
pub const ALL_CATEGORY: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub members: Vec<String>,
}

/// Category name to member packages.
#[derive(Debug, Default)]
pub struct CategoryIndex {
    categories: BTreeMap<String, Category>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<&Category> {
        self.categories.get(&category.to_lowercase())
    }

    /// Member package names, empty for an unknown category.
    pub fn members(&self, category: &str) -> &[String] {
        self.get(category)
            .map(|c| c.members.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn insert(&mut self, category: &str, package: &str) {
        let entry = self
            .categories
            .entry(category.to_lowercase())
            .or_insert_with(|| Category {
                name: category.to_string(),
                members: Vec::new(),
            });
        if !entry.members.iter().any(|m| m == package) {
            entry.members.push(package.to_string());
        }
    }

    fn retract(&mut self, category: &str, package: &str) {
        let key = category.to_lowercase();
        if let Some(entry) = self.categories.get_mut(&key) {
            entry.members.retain(|m| m != package);
            if entry.members.is_empty() {
                self.categories.remove(&key);
            }
        }
    }
}

impl PackageMeta {
    pub fn add_category(&mut self, index: &mut CategoryIndex, category: &str) {
        let key = category.to_lowercase();
        if self.categories.contains_key(&key) {
            return;
        }
        index.insert(category, &self.name);
        self.categories.insert(key, category.to_string());
    }

    /// Withdraw this package from every category it is in.
    pub fn retract_categories(&mut self, index: &mut CategoryIndex) {
        for category in self.categories.values() {
            index.retract(category, &self.name);
        }
        self.categories.clear();
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(&category.to_lowercase())
    }

    pub fn has_no_categories(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category names in case-insensitive order, as first spelled.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.values().map(String::as_str)
    }

    pub fn add_to_category_base(&mut self, index: &mut CategoryIndex) {
        self.add_category(index, BASE_CATEGORY);
    }

    pub fn set_default_categories(&mut self, index: &mut CategoryIndex) {
        self.add_category(index, ORPHANED_CATEGORY);
    }

    pub fn add_to_category_all(&mut self, index: &mut CategoryIndex) {
        self.add_category(index, ALL_CATEGORY);
    }

    pub fn readable_category_list(&self) -> String {
        self.categories()
            .filter(|c| !c.eq_ignore_ascii_case(ALL_CATEGORY))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_bidirectional() {
        let mut index = CategoryIndex::new();
        let mut foo = PackageMeta::new("foo");
        let mut bar = PackageMeta::new("bar");

        foo.add_category(&mut index, "Devel");
        bar.add_category(&mut index, "devel");
        foo.add_category(&mut index, "DEVEL");

        assert!(foo.has_category("devel"));
        assert_eq!(foo.categories().collect::<Vec<_>>(), vec!["Devel"]);
        assert_eq!(index.members("Devel"), &["foo".to_string(), "bar".to_string()]);
        assert_eq!(index.get("devel").unwrap().name, "Devel");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_retract_categories() {
        let mut index = CategoryIndex::new();
        let mut foo = PackageMeta::new("foo");
        let mut bar = PackageMeta::new("bar");

        foo.add_category(&mut index, "Devel");
        foo.add_category(&mut index, "Shells");
        bar.add_category(&mut index, "Devel");

        foo.retract_categories(&mut index);

        assert!(foo.has_no_categories());
        assert_eq!(index.members("Devel"), &["bar".to_string()]);
        assert!(index.get("Shells").is_none());
        assert!(index.members("Shells").is_empty());
    }

    #[test]
    fn test_readable_category_list_skips_all() {
        let mut index = CategoryIndex::new();
        let mut foo = PackageMeta::new("foo");

        foo.add_to_category_all(&mut index);
        foo.add_category(&mut index, "Shells");
        foo.add_to_category_base(&mut index);

        assert_eq!(foo.readable_category_list(), "Base, Shells");
        assert_eq!(index.members(ALL_CATEGORY), &["foo".to_string()]);
    }

    #[test]
    fn test_default_categories() {
        let mut index = CategoryIndex::new();
        let mut foo = PackageMeta::new("foo");
        assert!(foo.has_no_categories());

        foo.set_default_categories(&mut index);
        assert!(foo.has_category(ORPHANED_CATEGORY));
        assert!(!foo.has_no_categories());
    }
}
