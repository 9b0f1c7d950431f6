//! Config directory for embedded messaging hosts
//!
//! SDK config files live in `~/.config/embedded-messaging/` unless the host
//! points a [`ConfigDir`] somewhere else (sandboxed app containers, tests).

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Directory name under the platform config root
pub const APP_DIR: &str = "embedded-messaging";

/// A directory holding JSON config files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// The per-user directory, if the platform has a config root
    pub fn user() -> Option<Self> {
        dirs::config_dir().map(|p| Self::at(p.join(APP_DIR)))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.path(filename).is_file()
    }

    /// Create the directory if it is missing
    pub fn ensure(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create config directory: {}", self.root.display()))?;
        Ok(&self.root)
    }

    pub fn load_json<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        load_json_file(&self.path(filename))
    }

    /// Write `value` as pretty JSON, creating the directory first
    pub fn save_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf> {
        let path = self.ensure()?.join(filename);
        save_json_file(&path, value)?;
        Ok(path)
    }
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}
