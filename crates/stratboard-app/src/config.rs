//! `config.toml` loading with environment overrides.

use anyhow::{Context, Result, bail};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stratboard_core::storage::{DEFAULT_AUTOSAVE_DELAY_MS, FileStorage};
use stratboard_core::StorageMode;

/// Which storage backend boards go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Guest,
    Cloud,
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" | "local" => Ok(Mode::Guest),
            "cloud" | "remote" => Ok(Mode::Cloud),
            other => bail!("unknown storage mode '{}' (expected guest or cloud)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub user_id: Option<String>,
    pub api_key: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3030".to_string(),
            user_id: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: Mode,
    /// Directory for guest-mode boards. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub autosave_ms: u64,
    pub viewport: ViewportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Guest,
            data_dir: None,
            remote: RemoteConfig::default(),
            autosave_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            viewport: ViewportConfig::default(),
        }
    }
}

impl AppConfig {
    /// `$XDG_CONFIG_HOME/stratboard/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stratboard").join("config.toml"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load from an explicit path (which must exist) or the default path
    /// (which may be missing), then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Apply `STRATBOARD_MODE`, `STRATBOARD_ENDPOINT` and `STRATBOARD_USER`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(mode) = lookup("STRATBOARD_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(endpoint) = lookup("STRATBOARD_ENDPOINT") {
            self.remote.endpoint = endpoint;
        }
        if let Some(user) = lookup("STRATBOARD_USER") {
            self.remote.user_id = Some(user);
        }
        Ok(())
    }

    pub fn storage_mode(&self) -> Result<StorageMode> {
        match self.mode {
            Mode::Guest => Ok(StorageMode::Guest),
            Mode::Cloud => {
                let user_id = self
                    .remote
                    .user_id
                    .clone()
                    .filter(|u| !u.trim().is_empty())
                    .context("cloud mode needs remote.user_id (or STRATBOARD_USER)")?;
                Ok(StorageMode::Cloud { user_id })
            }
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(FileStorage::default_path()?),
        }
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport.width, self.viewport.height)
    }

    pub fn autosave_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.autosave_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.autosave_ms, 1000);
        assert_eq!(config.storage_mode().unwrap(), StorageMode::Guest);
    }

    #[test]
    fn test_parse_full() {
        let config = AppConfig::from_toml(
            r#"
            mode = "cloud"
            data_dir = "/tmp/boards"
            autosave_ms = 250

            [remote]
            endpoint = "https://boards.example.com"
            user_id = "u-42"

            [viewport]
            width = 1920
            height = 1080
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Cloud);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/boards"));
        assert_eq!(config.viewport(), Size::new(1920.0, 1080.0));
        assert_eq!(
            config.storage_mode().unwrap(),
            StorageMode::Cloud {
                user_id: "u-42".into()
            }
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STRATBOARD_MODE", "cloud"),
            ("STRATBOARD_ENDPOINT", "http://10.0.0.2:3030"),
            ("STRATBOARD_USER", "alice"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.mode, Mode::Cloud);
        assert_eq!(config.remote.endpoint, "http://10.0.0.2:3030");
        assert_eq!(config.remote.user_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_cloud_requires_user() {
        let config = AppConfig {
            mode: Mode::Cloud,
            ..Default::default()
        };
        assert!(config.storage_mode().is_err());
        assert!("sideways".parse::<Mode>().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "autosave_ms = 42\n").unwrap();
        let config = AppConfig::read(&path).unwrap();
        assert_eq!(config.autosave_ms, 42);
        assert!(AppConfig::read(&dir.path().join("missing.toml")).is_err());
    }
}
