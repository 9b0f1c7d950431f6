//! SDK configuration loading
//!
//! Supports loading the API key and app identity from (in order of priority):
//! 1. Compile-time embedded values (for production builds)
//! 2. JSON file in the shared config directory
//! 3. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use ::config::ConfigDir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config filename in the shared config directory
const CONFIG_FILE: &str = "embedded-sdk.json";

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.iterable.com/api";

/// Platform reported in requests and device info
pub const DEFAULT_PLATFORM: &str = "Web";

/// Settings shared by the fetch and telemetry collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    pub api_key: String,
    pub package_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_sdk_version")]
    pub sdk_version: String,
    #[serde(default = "default_device_id")]
    pub device_id: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

fn default_sdk_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_device_id() -> String {
    format!("embedded-rs/{}", env!("CARGO_PKG_VERSION"))
}

impl SdkConfig {
    /// Create a config with defaults for everything but the key and package
    pub fn new(api_key: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            package_name: package_name.into(),
            base_url: default_base_url(),
            platform: default_platform(),
            sdk_version: default_sdk_version(),
            device_id: default_device_id(),
        }
    }

    /// Override the API root (tests, regional data centers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Load config using the following priority:
    /// 1. Compile-time embedded values
    /// 2. JSON file (~/.config/embedded-messaging/embedded-sdk.json)
    /// 3. Runtime environment variables
    pub fn load() -> Result<Self> {
        match ConfigDir::user() {
            Some(dir) => Self::load_from(&dir),
            None => Self::from_compile_time().map_or_else(Self::from_env, Ok),
        }
    }

    /// Same priority as [`SdkConfig::load`], reading the file from `dir`
    pub fn load_from(dir: &ConfigDir) -> Result<Self> {
        if let Some(cfg) = Self::from_compile_time() {
            return Ok(cfg);
        }

        if dir.contains(CONFIG_FILE) {
            return Self::from_file(&dir.path(CONFIG_FILE));
        }

        Self::from_env()
    }

    /// Values embedded at compile time via environment variables.
    /// Build with: EMBEDDED_API_KEY=xxx EMBEDDED_PACKAGE_NAME=yyy cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let api_key = option_env!("EMBEDDED_API_KEY")?;
        let package_name = option_env!("EMBEDDED_PACKAGE_NAME")?;

        if api_key.is_empty() || package_name.is_empty() {
            return None;
        }

        Some(Self::new(api_key, package_name))
    }

    /// Load config from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let cfg: SdkConfig = ::config::load_json_file(path)?;
        cfg.validated()
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: SdkConfig = serde_json::from_str(json).context("Failed to parse SDK config JSON")?;
        cfg.validated()
    }

    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("EMBEDDED_API_KEY")
            .context("EMBEDDED_API_KEY environment variable not set")?;
        let package_name = std::env::var("EMBEDDED_PACKAGE_NAME")
            .context("EMBEDDED_PACKAGE_NAME environment variable not set")?;

        let mut cfg = Self::new(api_key, package_name);
        if let Ok(base_url) = std::env::var("EMBEDDED_BASE_URL") {
            cfg.base_url = base_url;
        }
        cfg.validated()
    }

    /// Write this config to the per-user config directory
    pub fn save(&self) -> Result<PathBuf> {
        let dir = ConfigDir::user().context("Could not determine config directory")?;
        self.save_to(&dir)
    }

    pub fn save_to(&self, dir: &ConfigDir) -> Result<PathBuf> {
        dir.save_json(CONFIG_FILE, self)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        ConfigDir::user().map(|dir| dir.path(CONFIG_FILE))
    }

    /// Check if config is available (compile-time, file, or env vars)
    pub fn is_available() -> bool {
        if Self::from_compile_time().is_some() {
            return true;
        }
        if ConfigDir::user().is_some_and(|dir| dir.contains(CONFIG_FILE)) {
            return true;
        }
        std::env::var("EMBEDDED_API_KEY").is_ok() && std::env::var("EMBEDDED_PACKAGE_NAME").is_ok()
    }

    fn validated(self) -> Result<Self> {
        anyhow::ensure!(!self.api_key.trim().is_empty(), "SDK config has an empty apiKey");
        anyhow::ensure!(
            !self.package_name.trim().is_empty(),
            "SDK config has an empty packageName"
        );
        url::Url::parse(&self.base_url)
            .with_context(|| format!("SDK config has an invalid baseUrl: {}", self.base_url))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{ "apiKey": "key-123", "packageName": "com.example.app" }"#;

        let cfg = SdkConfig::from_json(json).unwrap();
        assert_eq!(cfg.api_key, "key-123");
        assert_eq!(cfg.package_name, "com.example.app");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.platform, DEFAULT_PLATFORM);
        assert_eq!(cfg.sdk_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "apiKey": "key-123",
            "packageName": "com.example.app",
            "baseUrl": "https://api.eu.iterable.com/api",
            "platform": "Web",
            "sdkVersion": "2.0.0",
            "deviceId": "device-1"
        }"#;

        let cfg = SdkConfig::from_json(json).unwrap();
        assert_eq!(cfg.base_url, "https://api.eu.iterable.com/api");
        assert_eq!(cfg.sdk_version, "2.0.0");
        assert_eq!(cfg.device_id, "device-1");
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let json = r#"{ "apiKey": " ", "packageName": "com.example.app" }"#;
        assert!(SdkConfig::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let json = r#"{ "apiKey": "k", "packageName": "p", "baseUrl": "not a url" }"#;
        assert!(SdkConfig::from_json(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let cfg = SdkConfig::new("key", "pkg");
        ::config::save_json_file(&path, &cfg).unwrap();

        assert_eq!(SdkConfig::from_file(&path).unwrap(), cfg);
    }

    #[test]
    fn test_save_then_load_from_dir() {
        if SdkConfig::from_compile_time().is_some() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::at(tmp.path().join("embedded-messaging"));
        let cfg = SdkConfig::new("key", "com.example.app").with_base_url("https://api.eu.iterable.com/api");

        let path = cfg.save_to(&dir).unwrap();

        assert!(path.ends_with(CONFIG_FILE));
        assert_eq!(SdkConfig::load_from(&dir).unwrap(), cfg);
    }

    #[test]
    fn test_invalid_file_in_dir_is_an_error() {
        if SdkConfig::from_compile_time().is_some() {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::at(tmp.path());
        std::fs::write(dir.path(CONFIG_FILE), r#"{ "apiKey": "", "packageName": "p" }"#).unwrap();

        assert!(SdkConfig::load_from(&dir).is_err());
    }
}
