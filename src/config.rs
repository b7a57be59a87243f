//! Configuration system for helium
//!
//! Loads configuration from TOML file at `~/.config/helium/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window_manager: WindowManagerConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("helium");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    pub fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Window manager configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowManagerConfig {
    pub decorations: WindowDecorationConfig,
    pub colors: WindowColors,
    pub behavior: WindowBehaviorConfig,
}

/// Window decoration geometry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDecorationConfig {
    /// Border width in pixels, on every side of the client
    pub border_width: u32,
    /// Smallest width a client can be resized to
    pub min_width: u32,
    /// Smallest height a client can be resized to
    pub min_height: u32,
}

impl Default for WindowDecorationConfig {
    fn default() -> Self {
        Self {
            border_width: 2,
            min_width: 16,
            min_height: 16,
        }
    }
}

/// Window colors configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowColors {
    /// Border of the focused window (hex: 0xRRGGBB)
    pub focused: u32,
    /// Border of every other window (hex: 0xRRGGBB)
    pub unfocused: u32,
}

impl Default for WindowColors {
    fn default() -> Self {
        Self {
            focused: 0xc1c1c1,
            unfocused: 0x3f3f3f,
        }
    }
}

/// Window behavior configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowBehaviorConfig {
    /// Give focus to windows as soon as they are mapped
    pub focus_new_windows: bool,
    /// Raise window when focused
    pub raise_on_focus: bool,
    /// Number of tags (virtual desktops), numbered from 1
    pub tag_count: u32,
}

impl Default for WindowBehaviorConfig {
    fn default() -> Self {
        Self {
            focus_new_windows: true,
            raise_on_focus: true,
            tag_count: 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::save_default(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[window_manager.decorations]\nborder_width = 4\n\n[window_manager.colors]\nfocused = 0xff0000\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.window_manager.decorations.border_width, 4);
        assert_eq!(config.window_manager.decorations.min_width, 16);
        assert_eq!(config.window_manager.colors.focused, 0xff0000);
        assert_eq!(config.window_manager.colors.unfocused, 0x3f3f3f);
        assert_eq!(config.window_manager.behavior, WindowBehaviorConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[window_manager\nborder_width = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn missing_file_is_an_error_for_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
