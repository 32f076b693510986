//! Application configuration.
//!
//! Values are layered: built-in defaults, then the TOML file under the
//! user's config directory (when present), then `ACTIVITY_*` environment
//! variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Directory under `~/.config` holding the configuration file.
pub const CONFIG_DIR: &str = "activity";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG: &str = r#"# Activity client configuration.

# Base URL of the game backend.
base_url = "http://localhost:8080/"

# Seconds before a backend request is abandoned.
request_timeout_secs = 10

# "http" talks to base_url, "memory" keeps everything in-process.
backend = "http"

# Length of a guessing turn in seconds.
turn_seconds = 60
"#;

/// Which remote collaborator the store talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON over HTTP against `base_url`.
    Http,
    /// In-process backend, nothing leaves the machine.
    Memory,
}

/// Runtime settings for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the REST backend.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Backend implementation to use.
    pub backend: BackendKind,
    /// Countdown length of a turn in seconds.
    pub turn_seconds: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            request_timeout_secs: 10,
            backend: BackendKind::Http,
            turn_seconds: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("base_url", defaults.base_url.clone())?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("backend", "http")?
            .set_default("turn_seconds", defaults.turn_seconds as i64)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("ACTIVITY").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Default path of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}
