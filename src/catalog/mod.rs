//! JSON package catalog: the repositories a client knows about and the
//! packages installed on this system.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::package::{PackageDb, PackageMessage, Script};
use crate::registry::{Archive, PackageData, Trust};
use crate::runtime::Runtime;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub installed: Vec<InstalledEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    /// Mirrors serving archives that list no sites of their own
    #[serde(default)]
    pub sites: Vec<String>,
    #[serde(default)]
    pub packages: Vec<CatalogPackage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CatalogPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub stability: Option<Trust>,
    #[serde(default)]
    pub sdesc: String,
    #[serde(default)]
    pub ldesc: String,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub archive: Archive,
    #[serde(default)]
    pub source: Option<Archive>,
    #[serde(default)]
    pub message: Option<PackageMessage>,
    #[serde(default)]
    pub scripts: Vec<Script>,
    /// Versions of this package never to offer
    #[serde(default)]
    pub blacklist: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstalledEntry {
    pub name: String,
    pub version: String,
}

impl Catalog {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read catalog {:?}", path))?;
        let catalog: Catalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {:?}", path))?;
        debug!(
            "Loaded {} repositories and {} installed packages from {:?}",
            catalog.repositories.len(),
            catalog.installed.len(),
            path
        );
        Ok(catalog)
    }

    /// Feed everything into `db`. Installed packages go in last so that they
    /// merge into the repository versions already present.
    pub fn populate(self, db: &mut PackageDb) {
        let mut blacklists: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for pkg in self.repositories.iter().flat_map(|r| &r.packages) {
            if !pkg.blacklist.is_empty() {
                blacklists
                    .entry(pkg.name.as_str())
                    .or_default()
                    .extend(pkg.blacklist.iter().cloned());
            }
        }
        for (name, blacklist) in blacklists {
            db.set_version_blacklist(name, blacklist);
        }

        for repo in &self.repositories {
            for pkg in &repo.packages {
                add_repository_package(db, repo, pkg);
            }
        }

        for entry in &self.installed {
            db.add_installed(&entry.name, &entry.version);
        }

        db.finalize_categories();
    }
}

fn add_repository_package(db: &mut PackageDb, repo: &Repository, pkg: &CatalogPackage) {
    let mut archive = pkg.archive.clone();
    if archive.sites.is_empty() {
        archive.sites = repo.sites.clone();
    }
    let source = pkg.source.clone().map(|mut source| {
        if source.sites.is_empty() {
            source.sites = repo.sites.clone();
        }
        source
    });

    let data = PackageData {
        version: pkg.version.clone(),
        vendor: repo.vendor.clone(),
        repo_name: repo.name.clone(),
        stability: pkg.stability,
        sdesc: pkg.sdesc.clone(),
        ldesc: pkg.ldesc.clone(),
        depends: pkg.depends.clone(),
        archive,
        source,
    };
    if db.add_version(&pkg.name, data).is_none() {
        return;
    }

    for category in &pkg.categories {
        if !db.add_category(&pkg.name, category) {
            warn!("Could not categorise unknown package {}", pkg.name);
        }
    }
    if let Some(message) = &pkg.message {
        db.set_message(&pkg.name, &message.id, &message.text);
    }
    for script in &pkg.scripts {
        db.add_script(&pkg.name, script.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{ALL_CATEGORY, ORPHANED_CATEGORY, Task};
    use crate::registry::VersionRegistry;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    const CATALOG: &str = r#"{
        "repositories": [
            {
                "name": "main",
                "vendor": "cygwin",
                "sites": ["https://mirror.example/"],
                "packages": [
                    {
                        "name": "vim",
                        "version": "9.0.1",
                        "stability": "curr",
                        "sdesc": "Vi IMproved",
                        "categories": ["Editors"],
                        "archive": {"path": "x86_64/release/vim/vim-9.0.1.tar.xz", "size": 1024},
                        "scripts": ["etc/postinstall/vim.sh"],
                        "message": {"id": "vim-note", "text": "Run vimtutor"}
                    },
                    {
                        "name": "vim",
                        "version": "9.1.0",
                        "stability": "test",
                        "categories": ["Editors"],
                        "archive": {"path": "x86_64/release/vim/vim-9.1.0.tar.xz", "size": 2048}
                    },
                    {
                        "name": "vim",
                        "version": "8.2.0",
                        "archive": {"path": "x86_64/release/vim/vim-8.2.0.tar.xz"},
                        "blacklist": ["8.2.0"]
                    }
                ]
            }
        ],
        "installed": [
            {"name": "vim", "version": "9.0.1"},
            {"name": "local-tool", "version": "0.1"}
        ]
    }"#;

    fn catalog_path() -> PathBuf {
        PathBuf::from("/etc/pkgmeta/catalog.json")
    }

    fn load(content: &'static str) -> Result<Catalog> {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(catalog_path()))
            .returning(move |_| Ok(content.to_string()));
        Catalog::load(&runtime, &catalog_path())
    }

    #[test]
    fn test_load_catalog() {
        let catalog = load(CATALOG).unwrap();

        assert_eq!(catalog.repositories.len(), 1);
        let vim = &catalog.repositories[0].packages[0];
        assert_eq!(vim.stability, Some(Trust::Curr));
        assert_eq!(vim.archive.size, 1024);
        assert!(vim.archive.sites.is_empty());
        assert_eq!(vim.scripts[0].path(), Path::new("etc/postinstall/vim.sh"));
        assert_eq!(catalog.installed[1].name, "local-tool");
    }

    #[test]
    fn test_load_invalid_catalog() {
        let err = load("{ not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse catalog"));
    }

    #[test]
    fn test_populate() {
        let mut db = PackageDb::new(Task::Install);
        load(CATALOG).unwrap().populate(&mut db);

        let vim = db.package("vim").unwrap();
        let pool = db.registry();
        // 8.2.0 is blacklisted
        assert_eq!(vim.versions().len(), 2);

        let installed = vim.installed().unwrap();
        let version = pool.get(installed).unwrap();
        assert!(version.is_installed_entry());
        assert_eq!(version.archive.sites, vec!["https://mirror.example/".to_string()]);
        assert_eq!(vim.curr(), Some(installed));
        assert_eq!(pool.canonical_version(vim.exp().unwrap()), "9.1.0");

        assert_eq!(vim.sdesc(pool), "Vi IMproved");
        assert_eq!(vim.readable_category_list(), "Editors");
        assert!(vim.has_category(ALL_CATEGORY));
        assert_eq!(vim.scripts().len(), 1);
        assert_eq!(vim.message().unwrap().id, "vim-note");

        let tool = db.package("local-tool").unwrap();
        assert!(tool.installed().is_some());
        assert!(tool.has_category(ORPHANED_CATEGORY));
    }
}
