use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An install-time hook. Scripts are only recorded here; running them is the
/// job of the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    path: PathBuf,
}

impl Script {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|s| s.to_str())
    }

    /// Interpreter selected by file extension, None if the script is not runnable.
    pub fn interpreter(&self) -> Option<&'static str> {
        match self.path.extension().and_then(|s| s.to_str()) {
            Some("sh") => Some("/bin/bash"),
            Some("dash") => Some("/bin/dash"),
            Some("bat") | Some("cmd") => Some("cmd.exe"),
            _ => None,
        }
    }
}
