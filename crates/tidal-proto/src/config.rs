use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Locations of the files shared with mpv and the login helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "platform::session_file_path")]
    pub session_file: PathBuf,
    #[serde(default = "platform::context_file_path")]
    pub context_file: PathBuf,
    #[serde(default = "platform::mpv_socket_path")]
    pub mpv_socket: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Explicit mpv binary; looked up on `PATH` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpv_binary: Option<PathBuf>,
    /// Pause between quitting the old player and spawning the new one.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    #[serde(default = "default_notify")]
    pub notify: bool,
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            session_file: platform::session_file_path(),
            context_file: platform::context_file_path(),
            mpv_socket: platform::mpv_socket_path(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mpv_binary: None,
            start_delay_ms: default_start_delay_ms(),
            notify: default_notify(),
            title_prefix: default_title_prefix(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            search_limit: default_search_limit(),
            audio_quality: default_audio_quality(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_start_delay_ms() -> u64 {
    100
}

fn default_notify() -> bool {
    true
}

fn default_title_prefix() -> String {
    "Tidal".to_string()
}

fn default_api_base() -> String {
    "https://api.tidal.com/v1".to_string()
}

fn default_search_limit() -> u32 {
    8
}

fn default_audio_quality() -> String {
    "LOSSLESS".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.player.start_delay_ms, 100);
        assert_eq!(config.catalog.search_limit, 8);
        assert!(config.catalog.api_base.starts_with("https://"));
        assert!(config.paths.mpv_socket.ends_with("rofi_tidal_mpv.sock"));
        assert!(config.paths.session_file.ends_with(".config/tidal_session.json"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [player]
            notify = false

            [catalog]
            search_limit = 3
            "#,
        )
        .unwrap();
        assert!(!config.player.notify);
        assert_eq!(config.player.title_prefix, "Tidal");
        assert_eq!(config.catalog.search_limit, 3);
        assert_eq!(config.catalog.audio_quality, "LOSSLESS");
        assert_eq!(config.paths.context_file, platform::context_file_path());
    }

    #[test]
    fn test_load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[player\nnotify = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
