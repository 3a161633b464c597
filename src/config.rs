//! Manager configuration and the host storage collaborator.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::ops::scheduler::{DEFAULT_MAX_CONCURRENCY, DEFAULT_POLL_INTERVAL};
use crate::util::Result;

/// Overrides `storage_dir`.
pub const ENV_DATA_DIR: &str = "SAVELOAD_DATA_DIR";
/// Overrides `max_concurrency`.
pub const ENV_MAX_CONCURRENCY: &str = "SAVELOAD_MAX_CONCURRENCY";

/// Key used when neither the config nor the request supplies one.
pub const DEFAULT_ENCRYPTION_KEY: &str = "5ZaX8nC2pY7kF4rO9gE0bL3tU1mQ6sWv";

/// Settings for a [`SaveLoadManager`](crate::SaveLoadManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Subdirectory name under the platform data directory.
    pub app_name: String,
    /// Where saves go when a request names no directory.
    pub storage_dir: Option<PathBuf>,
    pub encryption_key: String,
    pub max_concurrency: usize,
    pub poll_interval_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            app_name: "saveload".into(),
            storage_dir: None,
            encryption_key: DEFAULT_ENCRYPTION_KEY.into(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl ManagerConfig {
    /// Read a JSON config file, then apply environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config.with_env_overrides())
    }

    /// Write as pretty JSON.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `SAVELOAD_DATA_DIR` and `SAVELOAD_MAX_CONCURRENCY`.
    /// Unparseable values are logged and ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var_os(ENV_DATA_DIR).map(PathBuf::from),
            std::env::var(ENV_MAX_CONCURRENCY).ok(),
        )
    }

    fn with_overrides(mut self, data_dir: Option<PathBuf>, max_concurrency: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.storage_dir = Some(dir);
        }
        if let Some(raw) = max_concurrency {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.max_concurrency = n,
                _ => warn!(value = %raw, "ignoring invalid {ENV_MAX_CONCURRENCY}"),
            }
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Supplies the default writable directory for save files.
pub trait StorageHost: Send + Sync {
    fn persistent_data_dir(&self) -> PathBuf;
}

/// Platform data directory (`dirs::data_dir()`) plus the app name, or the
/// current directory when the platform has none.
#[derive(Debug, Clone)]
pub struct DefaultHost {
    app_name: String,
}

impl DefaultHost {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl StorageHost for DefaultHost {
    fn persistent_data_dir(&self) -> PathBuf {
        match dirs::data_dir() {
            Some(mut p) => {
                p.push(&self.app_name);
                p
            }
            None => PathBuf::from("."),
        }
    }
}

/// Always answers with the same directory.
impl StorageHost for PathBuf {
    fn persistent_data_dir(&self) -> PathBuf {
        self.clone()
    }
}
