//! Configuration loaded from `~/.config/stackwatch/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use directories::BaseDirs;

use crate::error::{Result, StackwatchError};
use crate::progress::driver::DriveOptions;
use crate::progress::RenderOptions;
use crate::stack::replay::ReplayOptions;

const CONFIG_DIR: &str = "stackwatch";
const MAIN_CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "stackwatch.log";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub render: RenderConfig,
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub interval_ms: u64,
    pub wrap_width: usize,
    pub color: bool,
    pub padding: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            interval_ms: 250,
            wrap_width: 100,
            color: true,
            padding: 2,
        }
    }
}

impl RenderConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            padding: 0,
            indent: self.padding,
            wrap_width: self.wrap_width.max(1),
            color: self.color,
        }
    }

    pub fn drive_options(&self) -> DriveOptions {
        DriveOptions {
            interval: Duration::from_millis(self.interval_ms.max(10)),
            column_padding: self.padding,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    pub speed: f64,
    pub max_delay_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_delay_ms: 2000,
        }
    }
}

impl ReplayConfig {
    pub fn replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            speed: self.speed,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

pub struct ConfigManager {
    config_dir: PathBuf,
    app_config: AppConfig,
}

impl ConfigManager {
    /// Loads the default config file, falling back to defaults when it is
    /// missing or invalid.
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let app_config = Self::load_toml_file(&config_dir.join(MAIN_CONFIG_FILE)).unwrap_or_default();
        Ok(Self {
            config_dir,
            app_config,
        })
    }

    /// Loads an explicitly named config file, which must exist.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StackwatchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let app_config = toml::from_str(&content)
            .map_err(|e| StackwatchError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            config_dir,
            app_config,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.app_config
    }

    pub fn app_config_mut(&mut self) -> &mut AppConfig {
        &mut self.app_config
    }

    /// Configured log file, or one under the platform cache directory.
    pub fn log_file(&self) -> PathBuf {
        if let Some(path) = &self.app_config.general.log_file {
            return path.clone();
        }
        BaseDirs::new()
            .map(|dirs| dirs.cache_dir().join(CONFIG_DIR).join(LOG_FILE))
            .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE))
    }

    fn get_config_dir() -> Result<PathBuf> {
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join(CONFIG_DIR))
            .ok_or_else(|| StackwatchError::Config("Could not determine config directory".to_string()))
    }

    fn load_toml_file<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Option<T> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)
                .map_err(|e| StackwatchError::Config(format!("Failed to create config dir: {}", e)))?;
        }
        Ok(())
    }

    /// Writes the default config file unless one already exists.
    pub fn write_default_config(&self) -> Result<PathBuf> {
        self.ensure_config_dir()?;

        let main_path = self.config_dir.join(MAIN_CONFIG_FILE);
        if !main_path.exists() {
            let content = toml::to_string_pretty(&AppConfig::default())
                .map_err(|e| StackwatchError::Config(format!("Failed to serialize config: {}", e)))?;
            std::fs::write(&main_path, content)
                .map_err(|e| StackwatchError::Config(format!("Failed to write config: {}", e)))?;
        }
        Ok(main_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.render.interval_ms, 250);
        assert_eq!(config.render.wrap_width, 100);
        assert!(config.render.color);
        assert_eq!(config.replay.speed, 1.0);
    }

    #[test]
    fn test_app_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[render]\nwrap_width = 60\n").unwrap();
        assert_eq!(parsed.render.wrap_width, 60);
        assert_eq!(parsed.render.interval_ms, 250);
        assert_eq!(parsed.general.log_level, "info");
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[replay]\nspeed = 4.0\n").unwrap();

        let manager = ConfigManager::from_path(&path).unwrap();
        assert_eq!(manager.app_config().replay.speed, 4.0);
        assert_eq!(manager.config_dir(), dir.path());
    }

    #[test]
    fn test_from_path_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ConfigManager::from_path(&missing),
            Err(StackwatchError::ConfigNotFound { .. })
        ));

        let invalid = dir.path().join("bad.toml");
        std::fs::write(&invalid, "[render\n").unwrap();
        assert!(matches!(
            ConfigManager::from_path(&invalid),
            Err(StackwatchError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_default_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MAIN_CONFIG_FILE);
        std::fs::write(&path, "not = [valid").unwrap();
        let loaded: Option<AppConfig> = ConfigManager::load_toml_file(&path);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_default_config() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager {
            config_dir: dir.path().join("nested"),
            app_config: AppConfig::default(),
        };
        let path = manager.write_default_config().unwrap();
        let reloaded = ConfigManager::from_path(&path).unwrap();
        assert_eq!(reloaded.app_config(), &AppConfig::default());
    }

    #[test]
    fn test_option_conversion() {
        let render = RenderConfig {
            interval_ms: 1,
            wrap_width: 0,
            color: false,
            padding: 3,
        };
        assert_eq!(render.drive_options().interval, Duration::from_millis(10));
        assert_eq!(render.render_options().wrap_width, 1);
        assert_eq!(render.render_options().indent, 3);

        let replay = ReplayConfig::default().replay_options();
        assert_eq!(replay.max_delay, Duration::from_secs(2));
    }
}
