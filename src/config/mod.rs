//! Configuration management
//!
//! Handles loading, validation, and saving of the TOML configuration file.
//! Every field has a default, so a partial file (or no file at all) works.
//!
//! Default location: `$XDG_CONFIG_HOME/yogaboard/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod types;

pub use types::{DevicesConfig, LoggingConfig, TouchpadConfig, MAX_TAP_DRAG_WINDOW};

/// Directory name under the XDG config home
pub const CONFIG_DIR: &str = "yogaboard";

/// Config file name
pub const CONFIG_FILE: &str = "config.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Touchpad gesture configuration
    #[serde(default)]
    pub touchpad: TouchpadConfig,
    /// Virtual device configuration
    #[serde(default)]
    pub devices: DevicesConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or the default path, falling back to defaults
    ///
    /// An explicitly given file must exist; a missing default file is not an
    /// error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Write the configuration as TOML, creating the directory
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Pretty TOML rendering
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let touchpad = &self.touchpad;
        if !(touchpad.pointer_sensitivity > 0.0 && touchpad.pointer_sensitivity.is_finite()) {
            anyhow::bail!(
                "Invalid pointer_sensitivity: {} (must be positive)",
                touchpad.pointer_sensitivity
            );
        }
        if !(touchpad.scroll_sensitivity > 0.0 && touchpad.scroll_sensitivity.is_finite()) {
            anyhow::bail!(
                "Invalid scroll_sensitivity: {} (must be positive)",
                touchpad.scroll_sensitivity
            );
        }
        if !(0.0..=MAX_TAP_DRAG_WINDOW).contains(&touchpad.tap_drag_window) {
            anyhow::bail!(
                "Invalid tap_drag_window: {} (must be between 0 and {} seconds)",
                touchpad.tap_drag_window,
                MAX_TAP_DRAG_WINDOW
            );
        }

        let devices = &self.devices;
        if devices.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be at least 1");
        }
        if devices.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be at least 1");
        }
        if devices.keyboard_name.trim().is_empty() || devices.touchpad_name.trim().is_empty() {
            anyhow::bail!("Device names must not be empty");
        }
        // uinput names are limited to UINPUT_MAX_NAME_SIZE (80) bytes
        for name in [&devices.keyboard_name, &devices.touchpad_name] {
            if name.len() >= 80 {
                anyhow::bail!("Device name too long: {}", name);
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.touchpad.pointer_sensitivity, 2.0);
        assert_eq!(config.touchpad.scroll_sensitivity, 0.15);
        assert!(config.touchpad.tap_drag_enabled);
        assert_eq!(config.touchpad.tap_drag_window, 0.25);
        assert_eq!(config.devices.keyboard_name, "Yogaboard-Virtual-Keyboard");
        assert_eq!(config.devices.queue_capacity, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [touchpad]
            pointer_sensitivity = 3.5
            mode = "passthrough"
            "#,
        )
        .unwrap();

        assert_eq!(config.touchpad.pointer_sensitivity, 3.5);
        assert_eq!(config.touchpad.scroll_sensitivity, 0.15);
        assert_eq!(config.touchpad.mode, crate::input::TouchpadMode::Passthrough);
        assert_eq!(config.devices, DevicesConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.touchpad.pointer_sensitivity = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.touchpad.tap_drag_window = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.touchpad.tap_drag_window = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.devices.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::default();
        config.touchpad.scroll_sensitivity = 0.3;
        config.devices.settle_delay_ms = 0;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_or_default(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_gesture_settings_conversion() {
        let settings = TouchpadConfig::default().gesture_settings();
        assert_eq!(settings, crate::input::GestureSettings::default());
    }

    #[test]
    fn test_huge_tap_drag_window_is_rejected() {
        let config: Config = toml::from_str("[touchpad]\ntap_drag_window = 1e30\n").unwrap();
        assert!(config.validate().is_err());

        // Unvalidated values still convert without panicking
        let settings = config.touchpad.gesture_settings();
        assert_eq!(
            settings.tap_drag_window,
            std::time::Duration::from_secs_f64(MAX_TAP_DRAG_WINDOW)
        );

        let mut config = Config::default();
        config.touchpad.tap_drag_window = MAX_TAP_DRAG_WINDOW;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_options_conversion() {
        let options = DevicesConfig::default().worker_options("kbd");
        assert_eq!(options.thread_name, "kbd");
        assert_eq!(options.poll_interval, std::time::Duration::from_millis(1));
        assert_eq!(options.shutdown_timeout, std::time::Duration::from_secs(1));
    }
}
