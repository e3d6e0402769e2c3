use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const CATALOG: &str = r#"{
    "repositories": [
        {
            "name": "main",
            "vendor": "cygwin",
            "sites": ["https://mirror.example/"],
            "packages": [
                {
                    "name": "bash",
                    "version": "5.2",
                    "stability": "curr",
                    "sdesc": "The GNU Bourne Again SHell",
                    "categories": ["Base", "Shells"],
                    "archive": {"path": "x86_64/release/bash/bash-5.2.tar.xz", "size": 4}
                },
                {
                    "name": "vim",
                    "version": "9.0",
                    "stability": "curr",
                    "sdesc": "Vi IMproved",
                    "categories": ["Editors"],
                    "archive": {"path": "x86_64/release/vim/vim-9.0.tar.xz", "size": 8},
                    "message": {"id": "vim-note", "text": "Run vimtutor"}
                },
                {
                    "name": "vim",
                    "version": "9.1",
                    "stability": "test",
                    "categories": ["Editors"],
                    "archive": {"path": "x86_64/release/vim/vim-9.1.tar.xz", "size": 8}
                },
                {
                    "name": "nano",
                    "version": "7.2",
                    "stability": "curr",
                    "categories": ["Editors"],
                    "archive": {"path": "x86_64/release/nano/nano-7.2.tar.xz", "size": 8}
                },
                {
                    "name": "xmoto",
                    "version": "0.6",
                    "stability": "curr",
                    "categories": ["Games"],
                    "archive": {"path": "x86_64/release/xmoto/xmoto-0.6.tar.xz", "size": 16}
                }
            ]
        }
    ],
    "installed": [
        {"name": "bash", "version": "5.1"},
        {"name": "nano", "version": "7.2"}
    ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn catalog(&self) -> PathBuf {
        self.root().join("catalog.json")
    }

    fn cache_file(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("pkgmeta"));
        cmd.env_remove("PKGMETA_CATALOG")
            .env_remove("RUST_LOG")
            .arg("--catalog")
            .arg(self.catalog())
            .arg("--local-package-dir")
            .arg(self.root());
        cmd
    }
}

fn status_line(name: &str, action: &str, installed: &str) -> String {
    format!("{:<24} {:<12} {}", name, action, installed)
}

#[test]
fn test_status_installs_selected_package() {
    let fixture = Fixture::new();

    fixture
        .command()
        .args(["status", "-P", "vim"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note for vim: Run vimtutor"))
        .stdout(predicate::str::contains(status_line("vim", "9.0", "-")))
        .stdout(predicate::str::contains(status_line("bash", "Keep", "5.1")))
        .stdout(predicate::str::contains(status_line("xmoto", "Skip", "-")));
}

#[test]
fn test_status_prefers_test_release() {
    let fixture = Fixture::new();

    fixture
        .command()
        .args(["status", "--trust", "test", "-C", "editors"])
        .assert()
        .success()
        .stdout(predicate::str::contains(status_line("vim", "9.1", "-")))
        .stdout(predicate::str::contains(status_line("nano", "Keep", "7.2")));
}

#[test]
fn test_status_removes_packages() {
    let fixture = Fixture::new();

    fixture
        .command()
        .args(["status", "-x", "nano,xmoto"])
        .assert()
        .success()
        .stdout(predicate::str::contains(status_line("nano", "Uninstall", "7.2")))
        .stdout(predicate::str::contains(status_line("xmoto", "Skip", "-")));
}

#[test]
fn test_show_package() {
    let fixture = Fixture::new();

    fixture
        .command()
        .args(["show", "vim"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Package: vim"))
        .stdout(predicate::str::contains("Summary: Vi IMproved"))
        .stdout(predicate::str::contains("Installed: (none)"))
        .stdout(predicate::str::contains("9.1 (Test)"))
        .stdout(predicate::str::contains("Uninstall (disabled)"));
}

#[test]
fn test_show_unknown_package_fails() {
    let fixture = Fixture::new();

    fixture
        .command()
        .args(["show", "emacs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Package emacs is not in the catalog."));
}

#[test]
fn test_scan_local_directory() {
    let fixture = Fixture::new();
    fixture.cache_file("x86_64/release/bash/bash-5.2.tar.xz", "data");
    // wrong size: counts as unavailable
    fixture.cache_file("x86_64/release/xmoto/xmoto-0.6.tar.xz", "short");

    fixture
        .command()
        .args(["--local-install", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unavailable: vim 9.0"))
        .stdout(predicate::str::contains("Unavailable: vim 9.1"))
        .stdout(predicate::str::contains("Unavailable: xmoto 0.6"))
        .stdout(predicate::str::contains("Dropped: vim"))
        .stdout(predicate::str::contains("Unavailable: bash").not())
        .stdout(predicate::str::contains("Unavailable: nano").not())
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn test_status_after_scan_hides_dropped_packages() {
    let fixture = Fixture::new();
    fixture.cache_file("x86_64/release/bash/bash-5.2.tar.xz", "data");

    fixture
        .command()
        .args(["--local-install", "status", "--scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains(status_line("bash", "Keep", "5.1")))
        .stdout(predicate::str::contains("vim").not());
}

#[test]
fn test_missing_catalog_fails() {
    let dir = tempdir().unwrap();

    Command::new(cargo::cargo_bin!("pkgmeta"))
        .env_remove("PKGMETA_CATALOG")
        .arg("--local-package-dir")
        .arg(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read catalog"));
}
