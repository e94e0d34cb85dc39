//! Configuration management for walkin.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::admin::DEFAULT_ADMIN_PIN;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "walkin";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "walkin.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "WALKIN_";

fn pin_shape() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}$").expect("static PIN pattern is valid"))
}

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `WALKIN_`, sections separated by
///    `__`, e.g. `WALKIN_KIOSK__ADMIN_PIN`)
/// 2. TOML config file at `~/.config/walkin/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Kiosk behaviour.
    pub kiosk: KioskConfig,
    /// CSV export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/walkin/walkin.db`
    pub database_path: Option<PathBuf>,
}

/// Kiosk-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Four-digit PIN that unlocks the admin view.
    #[serde(deserialize_with = "deserialize_pin")]
    pub admin_pin: String,
    /// Seconds between day-rollover sweeps in the interactive kiosk.
    pub rollover_interval_secs: u64,
}

/// Export-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory CSV exports are written to.
    /// Defaults to the current working directory.
    pub directory: Option<PathBuf>,
}

/// Environment values such as `1357` arrive as integers; leading zeros are
/// restored to four digits.
fn deserialize_pin<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPin {
        Text(String),
        Number(u64),
    }

    Ok(match RawPin::deserialize(deserializer)? {
        RawPin::Text(pin) => pin,
        RawPin::Number(pin) => format!("{pin:04}"),
    })
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            admin_pin: DEFAULT_ADMIN_PIN.to_string(),
            rollover_interval_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// The provider stack for a given config file.
    #[must_use]
    pub fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from a figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !pin_shape().is_match(&self.kiosk.admin_pin) {
            return Err(Error::ConfigValidation {
                message: "admin_pin must be exactly 4 digits".to_string(),
            });
        }

        if self.kiosk.rollover_interval_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "rollover_interval_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the rollover interval as a Duration.
    #[must_use]
    pub fn rollover_interval(&self) -> Duration {
        Duration::from_secs(self.kiosk.rollover_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.kiosk.admin_pin, "2468");
        assert_eq!(config.kiosk.rollover_interval_secs, 60);
        assert!(config.export.directory.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_pin() {
        for pin in ["", "123", "12345", "12a4"] {
            let mut config = Config::default();
            config.kiosk.admin_pin = pin.to_string();

            let err = config.validate().unwrap_err().to_string();
            assert!(err.contains("admin_pin"), "pin {pin:?} accepted");
        }
    }

    #[test]
    fn test_validate_zero_rollover_interval() {
        let mut config = Config::default();
        config.kiosk.rollover_interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("rollover_interval_secs"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("walkin.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_export_dir() {
        let mut config = Config::default();
        assert_eq!(config.export_dir(), PathBuf::from("."));

        config.export.directory = Some(PathBuf::from("/srv/exports"));
        assert_eq!(config.export_dir(), PathBuf::from("/srv/exports"));
    }

    #[test]
    fn test_rollover_interval() {
        assert_eq!(
            Config::default().rollover_interval(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.ends_with("walkin/config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[kiosk]\nadmin_pin = \"1357\"\n\n[export]\ndirectory = \"/tmp/exports\"\n",
            )?;

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.kiosk.admin_pin, "1357");
            assert_eq!(config.kiosk.rollover_interval_secs, 60);
            assert_eq!(config.export_dir(), PathBuf::from("/tmp/exports"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_file_value_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[kiosk]\nadmin_pin = \"12\"\n")?;

            let result = Config::load_from(Some(PathBuf::from("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[kiosk]\nadmin_pin = \"1111\"\nrollover_interval_secs = 30\n",
            )?;
            jail.set_env("WALKIN_KIOSK__ADMIN_PIN", "1357");
            jail.set_env("WALKIN_STORAGE__DATABASE_PATH", "/srv/walkin/kiosk.db");

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.kiosk.admin_pin, "1357");
            assert_eq!(config.kiosk.rollover_interval_secs, 30);
            assert_eq!(
                config.database_path(),
                PathBuf::from("/srv/walkin/kiosk.db")
            );
            Ok(())
        });
    }

    #[test]
    fn test_env_pin_keeps_leading_zero() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("WALKIN_KIOSK__ADMIN_PIN", "0246");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.kiosk.admin_pin, "0246");
            Ok(())
        });
    }

    #[test]
    fn test_numeric_pin_in_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[kiosk]\nadmin_pin = 1357\n")?;

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.kiosk.admin_pin, "1357");
            Ok(())
        });
    }

    #[test]
    fn test_env_rollover_interval() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("WALKIN_KIOSK__ROLLOVER_INTERVAL_SECS", "15");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.rollover_interval(), Duration::from_secs(15));
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
