//! Command-line package selection.
//!
//! Users name packages and categories to install or remove through repeatable,
//! comma-separated options. The lists are parsed once into a
//! [`SelectionContext`] which is then queried for every package.

use log::debug;
use std::collections::BTreeSet;

/// Split one option value into names, dropping empty segments.
///
/// Names are not trimmed: `"a, b"` yields `"a"` and `" b"`.
pub fn parse_names(option: &str) -> impl Iterator<Item = &str> {
    option.split(',').filter(|name| !name.is_empty())
}

fn parse_all(options: &[String]) -> BTreeSet<String> {
    options
        .iter()
        .flat_map(|option| parse_names(option))
        .map(String::from)
        .collect()
}

/// Parsed include/exclude lists.
///
/// Package names match exactly; category names match case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    packages: BTreeSet<String>,
    categories: BTreeSet<String>,
    remove_packages: BTreeSet<String>,
    remove_categories: BTreeSet<String>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(
        packages: &[String],
        categories: &[String],
        remove_packages: &[String],
        remove_categories: &[String],
    ) -> Self {
        let lower = |set: BTreeSet<String>| -> BTreeSet<String> {
            set.into_iter().map(|c| c.to_lowercase()).collect()
        };

        Self {
            packages: parse_all(packages),
            categories: lower(parse_all(categories)),
            remove_packages: parse_all(remove_packages),
            remove_categories: lower(parse_all(remove_categories)),
        }
    }

    /// True if anything at all was selected on the command line.
    pub fn has_manual_selections(&self) -> bool {
        !(self.packages.is_empty()
            && self.categories.is_empty()
            && self.remove_packages.is_empty()
            && self.remove_categories.is_empty())
    }

    /// True if `name`, or one of its `categories`, was selected for install.
    pub fn is_manually_wanted<'c>(
        &self,
        name: &str,
        categories: impl IntoIterator<Item = &'c str>,
    ) -> bool {
        let wanted = matches(name, categories, &self.packages, &self.categories);
        if wanted {
            debug!("Added manual package {}", name);
        }
        wanted
    }

    /// True if `name`, or one of its `categories`, was selected for removal.
    pub fn is_manually_deleted<'c>(
        &self,
        name: &str,
        categories: impl IntoIterator<Item = &'c str>,
    ) -> bool {
        let deleted = matches(
            name,
            categories,
            &self.remove_packages,
            &self.remove_categories,
        );
        if deleted {
            debug!("Deleted manual package {}", name);
        }
        deleted
    }
}

fn matches<'c>(
    name: &str,
    categories: impl IntoIterator<Item = &'c str>,
    names: &BTreeSet<String>,
    category_names: &BTreeSet<String>,
) -> bool {
    if names.contains(name) {
        return true;
    }
    if category_names.is_empty() {
        return false;
    }

    categories.into_iter().any(|category| {
        let found = category_names.contains(&category.to_lowercase());
        if found {
            debug!("Found category {} in package {}", category, name);
        }
        found
    })
}
